use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::FormatError;

/// One row of a dataset. Key order is the column order.
pub type Record = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatasetId {
    Watched,
    Watchlist,
    Reviews,
    Ratings,
    Comments,
    /// The server's catalogue of enriched movies.
    Movies,
    /// Any other dataset the server knows by name.
    File(String),
    /// A static CSV file, fetched by path.
    Csv(String),
}

pub static STANDARD_DATASETS: [DatasetId; 5] = [
    DatasetId::Watched,
    DatasetId::Watchlist,
    DatasetId::Reviews,
    DatasetId::Ratings,
    DatasetId::Comments,
];

/// Datasets listed in the sidebar besides the statistics view.
pub static BROWSABLE_DATASETS: [DatasetId; 6] = [
    DatasetId::Watched,
    DatasetId::Watchlist,
    DatasetId::Reviews,
    DatasetId::Ratings,
    DatasetId::Comments,
    DatasetId::Movies,
];

impl DatasetId {
    pub fn as_str(&self) -> &str {
        match self {
            DatasetId::Watched => "watched",
            DatasetId::Watchlist => "watchlist",
            DatasetId::Reviews => "reviews",
            DatasetId::Ratings => "ratings",
            DatasetId::Comments => "comments",
            DatasetId::Movies => "movies",
            DatasetId::File(name) => name,
            DatasetId::Csv(path) => path,
        }
    }

    pub fn label(&self) -> String {
        match self {
            DatasetId::Watched => "Watched".to_string(),
            DatasetId::Watchlist => "Watchlist".to_string(),
            DatasetId::Reviews => "Reviews".to_string(),
            DatasetId::Ratings => "Ratings".to_string(),
            DatasetId::Comments => "Comments".to_string(),
            DatasetId::Movies => "Movies".to_string(),
            DatasetId::File(name) => name.clone(),
            DatasetId::Csv(path) => path
                .rsplit('/')
                .next()
                .unwrap_or(path.as_str())
                .to_string(),
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = match s {
            "watched" => DatasetId::Watched,
            "watchlist" => DatasetId::Watchlist,
            "reviews" => DatasetId::Reviews,
            "ratings" => DatasetId::Ratings,
            "comments" => DatasetId::Comments,
            "movies" => DatasetId::Movies,
            other if other.to_ascii_lowercase().ends_with(".csv") => {
                DatasetId::Csv(other.to_string())
            }
            other => DatasetId::File(other.to_string()),
        };
        Ok(id)
    }
}

/// Columns of a dataset, taken from the keys of its first record.
pub fn columns_of<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .next()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default()
}

/// Value of `column` in `record`, or the empty string when absent.
pub fn cell<'a>(record: &'a Record, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or("")
}

/// Decodes a JSON dataset body. `null` is an empty dataset; every element
/// must be an object. Non-string values are stringified, `null` cells
/// become empty strings.
pub fn records_from_json(body: &str) -> Result<Vec<Record>, FormatError> {
    let rows: Option<Vec<IndexMap<String, Value>>> =
        serde_json::from_str(body).map_err(|e| FormatError::Payload(e.to_string()))?;

    Ok(rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(k, v)| (k, cell_text(v)))
                .collect::<Record>()
        })
        .collect())
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
