//! Summary metrics over the five standard datasets.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, instrument, trace, warn};

use crate::domain::FormatError;
use crate::record::{DatasetId, Record, STANDARD_DATASETS, cell};
use crate::source::DataSource;

pub type DatasetMap = HashMap<DatasetId, Vec<Record>>;

const TOP_TAGS: usize = 3;
const NONE_TEXT: &str = "None";

/// Aggregates the server computes over its movie catalogue. Fields the
/// server did not report stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerStatistics {
    #[serde(default)]
    pub average_runtime: Option<f64>,
    #[serde(default)]
    pub top_production_countries: Option<Vec<CountryCount>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

pub fn statistics_from_json(body: &str) -> Result<ServerStatistics, FormatError> {
    serde_json::from_str(body).map_err(|e| FormatError::Payload(e.to_string()))
}

/// Display slots of the statistics view. `None` leaves a slot unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSlots {
    pub total_watched: Option<String>,
    pub top_year: Option<String>,
    pub watchlist_length: Option<String>,
    pub average_rating: Option<String>,
    pub total_reviews: Option<String>,
    pub top_tags: Option<String>,
    pub average_runtime: Option<String>,
    pub top_countries: Option<String>,
}

impl StatsSlots {
    /// Slot labels and values in display order.
    pub fn entries(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("Films watched", self.total_watched.as_deref()),
            ("Top year", self.top_year.as_deref()),
            ("Watchlist", self.watchlist_length.as_deref()),
            ("Average rating", self.average_rating.as_deref()),
            ("Reviews", self.total_reviews.as_deref()),
            ("Top tags", self.top_tags.as_deref()),
            ("Avg runtime", self.average_runtime.as_deref()),
            ("Top countries", self.top_countries.as_deref()),
        ]
    }
}

impl fmt::Display for StatsSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.entries() {
            writeln!(f, "{label:<16}{}", value.unwrap_or("-"))?;
        }
        Ok(())
    }
}

/// Computes the statistics view. Holds nothing but the last metrics.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    slots: StatsSlots,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &StatsSlots {
        &self.slots
    }

    /// Fetches the five standard datasets concurrently. A dataset that fails
    /// to load is logged and replaced by an empty one, so the result always
    /// has all five entries.
    #[instrument(skip(source))]
    pub async fn load_all(source: &dyn DataSource) -> DatasetMap {
        let start_time = Instant::now();
        let fetches = STANDARD_DATASETS.iter().map(|id| async move {
            let records = source.fetch_dataset(id).await.unwrap_or_else(|e| {
                warn!("Failed to load {id}: {e}");
                Vec::new()
            });
            (id.clone(), records)
        });
        let data: DatasetMap = join_all(fetches).await.into_iter().collect();
        info!(
            "Loaded {} datasets in {}ms",
            data.len(),
            start_time.elapsed().as_millis()
        );
        data
    }

    /// Fetches the server's own aggregates. Failure leaves them unreported.
    #[instrument(skip(source))]
    pub async fn load_server_statistics(source: &dyn DataSource) -> ServerStatistics {
        source.fetch_statistics().await.unwrap_or_else(|e| {
            warn!("Failed to load server statistics: {e}");
            ServerStatistics::default()
        })
    }

    /// Runs every computation over `data`. Missing entries count as empty.
    pub fn process(&mut self, data: &DatasetMap) {
        let get = |id| data.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        self.compute_watched_stats(get(DatasetId::Watched));
        self.compute_watchlist_stats(get(DatasetId::Watchlist));
        self.compute_rating_review_stats(get(DatasetId::Ratings), get(DatasetId::Reviews));
        self.compute_comment_stats(get(DatasetId::Comments));
    }

    pub fn compute_watched_stats(&mut self, watched: &[Record]) {
        if watched.is_empty() {
            return;
        }
        self.slots.total_watched = Some(watched.len().to_string());
        if let Some((year, count)) = top_year(watched) {
            self.slots.top_year = Some(format!("{year} ({count})"));
        }
    }

    pub fn compute_watchlist_stats(&mut self, watchlist: &[Record]) {
        self.slots.watchlist_length = Some(watchlist.len().to_string());
    }

    pub fn compute_rating_review_stats(&mut self, ratings: &[Record], reviews: &[Record]) {
        if let Some(avg) = average_rating(ratings, reviews) {
            self.slots.average_rating = Some(one_decimal(avg));
        }
        self.slots.total_reviews = Some(reviews.len().to_string());

        let tags = top_tags(reviews, TOP_TAGS);
        self.slots.top_tags = Some(counted_list(tags));
    }

    /// Reserved for comment metrics; leaves every slot untouched.
    pub fn compute_comment_stats(&mut self, _comments: &[Record]) {}

    pub fn compute_server_stats(&mut self, server: &ServerStatistics) {
        if let Some(runtime) = server.average_runtime.filter(|r| r.is_finite()) {
            self.slots.average_runtime = Some(format!("{} min", one_decimal(runtime)));
        }
        if let Some(countries) = &server.top_production_countries {
            self.slots.top_countries = Some(counted_list(
                countries.iter().map(|c| (c.country.as_str(), c.count)),
            ));
        }
    }
}

/// One decimal place, ties rounded away from zero (4.25 gives "4.3").
fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

/// "a (2), b (1)", or "None" for an empty list.
fn counted_list<'a>(items: impl IntoIterator<Item = (&'a str, usize)>) -> String {
    let parts: Vec<String> = items
        .into_iter()
        .map(|(name, count)| format!("{name} ({count})"))
        .collect();
    if parts.is_empty() {
        NONE_TEXT.to_string()
    } else {
        parts.join(", ")
    }
}

/// Most frequent `Year`, ties going to the year seen first.
pub fn top_year(watched: &[Record]) -> Option<(&str, usize)> {
    let counts = count_first_seen(
        watched
            .iter()
            .map(|r| cell(r, "Year"))
            .filter(|y| !y.is_empty()),
    );
    most_frequent(counts, 1).into_iter().next()
}

/// Mean over every numeric `Rating` in `ratings` and every non-empty
/// `Rating` in `reviews`. Values that do not parse are skipped.
pub fn average_rating(ratings: &[Record], reviews: &[Record]) -> Option<f64> {
    let values: Vec<f64> = ratings
        .iter()
        .map(|r| cell(r, "Rating"))
        .chain(
            reviews
                .iter()
                .map(|r| cell(r, "Rating"))
                .filter(|v| !v.is_empty()),
        )
        .filter_map(parse_rating)
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Whole-value parse: "4 stars" or "4/5" are rejected, not read as 4.
fn parse_rating(value: &str) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            trace!("Skipping non-numeric rating {value:?}");
            None
        }
    }
}

/// The `limit` most used review tags, ties in first-seen order.
pub fn top_tags(reviews: &[Record], limit: usize) -> Vec<(&str, usize)> {
    let tags = reviews
        .iter()
        .flat_map(|r| cell(r, "Tags").split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    most_frequent(count_first_seen(tags), limit)
}

fn count_first_seen<'a>(values: impl Iterator<Item = &'a str>) -> IndexMap<&'a str, usize> {
    let mut counts = IndexMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

fn most_frequent<'a>(counts: IndexMap<&'a str, usize>, limit: usize) -> Vec<(&'a str, usize)> {
    let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
    // Stable, so equal counts keep their first-seen order.
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted.truncate(limit);
    sorted
}
