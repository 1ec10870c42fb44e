use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::csv::parse_csv;
use crate::domain::{DashError, FetchError};
use crate::record::{DatasetId, Record, records_from_json};
use crate::stats::{ServerStatistics, statistics_from_json};

/// Where datasets come from. Injected into the explorer, the aggregator and
/// the dashboard so tests can substitute their own.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch a named dataset as records.
    async fn fetch_dataset(&self, id: &DatasetId) -> Result<Vec<Record>, DashError>;

    /// Fetch a static file as raw text.
    async fn fetch_text(&self, path: &str) -> Result<String, DashError>;

    /// Aggregates computed by the server itself. Sources without a server
    /// report none.
    async fn fetch_statistics(&self) -> Result<ServerStatistics, DashError> {
        Ok(ServerStatistics::default())
    }
}

/// Fetch any dataset, routing static CSV files through the CSV parser.
pub async fn fetch_records(
    source: &dyn DataSource,
    id: &DatasetId,
) -> Result<Vec<Record>, DashError> {
    match id {
        DatasetId::Csv(path) => {
            let text = source.fetch_text(path).await?;
            Ok(parse_csv(&text)?)
        }
        _ => source.fetch_dataset(id).await,
    }
}

/// Talks to the data server: `GET <base>/api/data?type=<id>`, plus
/// `/api/movies` for the catalogue and `/api/statistics`.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            target: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                target: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(transport)
    }
}

#[async_trait]
impl DataSource for HttpSource {
    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_dataset(&self, id: &DatasetId) -> Result<Vec<Record>, DashError> {
        let body = match id {
            DatasetId::Movies => {
                let url = format!("{}/api/movies", self.base_url);
                self.get_text(&url, &[]).await?
            }
            _ => {
                let url = format!("{}/api/data", self.base_url);
                self.get_text(&url, &[("type", id.as_str())]).await?
            }
        };
        let records = records_from_json(&body)?;
        debug!("Fetched {} records for {id}", records.len());
        Ok(records)
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_text(&self, path: &str) -> Result<String, DashError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Ok(self.get_text(&url, &[]).await?)
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_statistics(&self) -> Result<ServerStatistics, DashError> {
        let url = format!("{}/api/statistics", self.base_url);
        let body = self.get_text(&url, &[]).await?;
        Ok(statistics_from_json(&body)?)
    }
}

/// Reads `<dir>/<id>.csv` exports straight from disk.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// `dir` may contain `~` and environment variables.
    pub fn new(dir: &str) -> Result<Self, FetchError> {
        let expanded = shellexpand::full(dir).map_err(|e| FetchError::Io {
            target: dir.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            dir: PathBuf::from(expanded.as_ref()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read(&self, path: PathBuf) -> Result<String, FetchError> {
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => FetchError::FileNotFound(path.clone()),
                ErrorKind::PermissionDenied => FetchError::PermissionDenied(path.clone()),
                _ => FetchError::Io {
                    target: path.display().to_string(),
                    reason: e.to_string(),
                },
            })
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn fetch_dataset(&self, id: &DatasetId) -> Result<Vec<Record>, DashError> {
        let name = id.as_str();
        let file = if name.to_ascii_lowercase().ends_with(".csv") {
            name.to_string()
        } else {
            format!("{name}.csv")
        };
        let text = self.read(self.dir.join(file)).await?;
        Ok(parse_csv(&text)?)
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn fetch_text(&self, path: &str) -> Result<String, DashError> {
        Ok(self.read(self.dir.join(path)).await?)
    }
}
