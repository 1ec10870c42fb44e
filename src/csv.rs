//! Strict comma splitter for the static CSV exports.
//!
//! There is no quoting or escaping: every comma separates two fields. A row
//! whose field count differs from the header rejects the whole file.

use tracing::debug;

use crate::domain::FormatError;
use crate::record::Record;

pub fn parse_csv(text: &str) -> Result<Vec<Record>, FormatError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or(FormatError::EmptyCsv)?;
    let headers: Vec<&str> = split_fields(header_line).collect();

    let mut records = Vec::new();
    for (lineno, line) in lines {
        let values: Vec<&str> = split_fields(line).collect();
        if values.len() != headers.len() {
            return Err(FormatError::FieldCount {
                line: lineno + 1,
                expected: headers.len(),
                found: values.len(),
            });
        }
        records.push(
            headers
                .iter()
                .zip(values)
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect::<Record>(),
        );
    }

    debug!(
        "Parsed CSV with {} columns and {} rows",
        headers.len(),
        records.len()
    );
    Ok(records)
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{cell, columns_of};

    #[test]
    fn parses_header_and_rows() {
        let text = "Date, Name ,Year\n2024-01-02,Heat,1995\r\n\n  \n2024-02-03, Alien ,1979\n";
        let records = parse_csv(text).unwrap();
        assert_eq!(columns_of(&records), vec!["Date", "Name", "Year"]);
        assert_eq!(records.len(), 2);
        assert_eq!(cell(&records[1], "Name"), "Alien");
        assert_eq!(cell(&records[1], "Year"), "1979");
    }

    #[test]
    fn header_only_is_empty_dataset() {
        assert!(parse_csv("\n\nName,Year\n").unwrap().is_empty());
    }

    #[test]
    fn blank_text_is_an_error() {
        assert_eq!(parse_csv(""), Err(FormatError::EmptyCsv));
        assert_eq!(parse_csv(" \n\t\n"), Err(FormatError::EmptyCsv));
    }

    #[test]
    fn field_count_mismatch_rejects_file() {
        let text = "Name,Year\nHeat,1995\n\"Crouching Tiger, Hidden Dragon\",2000\nAlien,1979\n";
        assert_eq!(
            parse_csv(text),
            Err(FormatError::FieldCount {
                line: 3,
                expected: 2,
                found: 3
            })
        );
    }
}
