//! Stroke-order animation data fetched from public CDNs.

use std::{sync::Arc, time::Duration};

use moka::future::Cache;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_SOURCES: [&str; 2] = [
    "https://cdn.jsdelivr.net/npm/hanzi-writer-data@latest",
    "https://raw.githubusercontent.com/chanind/hanzi-writer-data/master",
];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, Error)]
pub enum StrokeDataError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {0}")]
    Http(u16),
    #[error("json error: {0}")]
    Serde(String),
    #[error("no stroke data for '{0}'")]
    NotFound(char),
}

/// Tries each source in order with a per-request timeout. The first success
/// per character is kept in memory; failures are not.
pub struct StrokeDataService {
    http: Client,
    sources: Vec<String>,
    cache: Cache<char, Arc<Value>>,
}

impl StrokeDataService {
    pub fn new(sources: Vec<String>, timeout: Duration) -> Result<Self, StrokeDataError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hanja-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StrokeDataError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            sources,
            cache: Cache::new(CACHE_CAPACITY),
        })
    }

    pub fn with_defaults() -> Result<Self, StrokeDataError> {
        Self::new(
            DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_TIMEOUT,
        )
    }

    pub async fn fetch(&self, character: char) -> Result<Arc<Value>, StrokeDataError> {
        if let Some(data) = self.cache.get(&character).await {
            return Ok(data);
        }

        for source in &self.sources {
            match self.fetch_from(source, character).await {
                Ok(data) => {
                    let data = Arc::new(data);
                    self.cache.insert(character, data.clone()).await;
                    return Ok(data);
                }
                Err(e) => {
                    warn!(character = %character, source = %source, error = %e, "stroke data source failed");
                }
            }
        }
        Err(StrokeDataError::NotFound(character))
    }

    async fn fetch_from(&self, source: &str, character: char) -> Result<Value, StrokeDataError> {
        let url = format!(
            "{}/{}.json",
            source.trim_end_matches('/'),
            urlencoding::encode(&character.to_string())
        );
        debug!(url = %url, "fetching stroke data");

        let res = self.http.get(&url).send().await.map_err(map_reqwest_error)?;
        let status = res.status();
        if !status.is_success() {
            return Err(StrokeDataError::Http(status.as_u16()));
        }
        res.json::<Value>()
            .await
            .map_err(|e| StrokeDataError::Serde(e.to_string()))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> StrokeDataError {
    if e.is_timeout() {
        StrokeDataError::Timeout
    } else {
        StrokeDataError::Transport(e.to_string())
    }
}
