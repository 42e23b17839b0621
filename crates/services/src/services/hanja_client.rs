//! HTTP client for the lookup API with read-through caching and prefetch.

use std::{sync::Arc, time::Duration};

use backon::{ExponentialBuilder, Retryable};
use db::models::{character::CharacterRecord, grade::GradeSummary};
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use utils::hanja_id::{MAX_GRADE, MIN_GRADE};

use super::hanja_cache::{CacheCategory, TwoTierCache};

/// Number of characters of a grade fetched ahead after the grade itself.
pub const PREFETCH_COUNT: usize = 10;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
}

impl ClientError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            Self::Serde(_) => false,
        }
    }
}

pub fn character_key(id: &str) -> String {
    format!("character_{id}")
}

pub fn grade_key(grade: u8) -> String {
    format!("grade_{grade}")
}

#[derive(Clone)]
pub struct HanjaClient {
    http: Client,
    base_url: String,
    cache: Arc<TwoTierCache>,
}

impl HanjaClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: impl Into<String>, cache: Arc<TwoTierCache>) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("hanja-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// `Ok(None)` when the API answers 404.
    pub async fn character(&self, id: &str) -> Result<Option<CharacterRecord>, ClientError> {
        let key = character_key(id);
        if let Some(record) = self.cache.get_as::<CharacterRecord>(&key).await {
            return Ok(Some(record));
        }

        let url = format!("{}/api/hanja/{}", self.base_url, urlencoding::encode(id));
        let Some(record) = self.get_json::<CharacterRecord>(&url).await? else {
            return Ok(None);
        };
        self.cache
            .set_as(&key, &record, CacheCategory::Character)
            .await;
        Ok(Some(record))
    }

    /// Fetches a grade summary, then prefetches its first characters. Grades
    /// outside 1-15 are `Ok(None)` without a request.
    pub async fn grade(&self, grade: u8) -> Result<Option<GradeSummary>, ClientError> {
        if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
            return Ok(None);
        }

        let key = grade_key(grade);
        let summary = match self.cache.get_as::<GradeSummary>(&key).await {
            Some(summary) => summary,
            None => {
                let url = format!("{}/api/grade/{grade}", self.base_url);
                let Some(summary) = self.get_json::<GradeSummary>(&url).await? else {
                    return Ok(None);
                };
                self.cache.set_as(&key, &summary, CacheCategory::Grade).await;
                summary
            }
        };

        let ahead = summary.character_ids.len().min(PREFETCH_COUNT);
        self.prefetch(&summary.character_ids[..ahead]).await;
        Ok(Some(summary))
    }

    /// Fetches every uncached ID concurrently. Failures are logged and dropped.
    pub async fn prefetch(&self, ids: &[String]) {
        let mut uncached = Vec::new();
        for id in ids {
            if self.cache.get(&character_key(id)).await.is_none() {
                uncached.push(id.as_str());
            }
        }
        if uncached.is_empty() {
            return;
        }
        debug!(count = uncached.len(), "prefetching characters");

        let results = join_all(uncached.iter().map(|id| self.character(id))).await;
        for (id, result) in uncached.iter().zip(results) {
            if let Err(e) = result {
                warn!(id = %id, error = %e, "prefetch failed");
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, ClientError> {
        (|| async { self.send(url).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(100))
                    .with_max_delay(Duration::from_secs(2))
                    .with_max_times(2),
            )
            .when(|e: &ClientError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "hanja api call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn send<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, ClientError> {
        let res = self.http.get(url).send().await.map_err(map_reqwest_error)?;
        match res.status() {
            s if s.is_success() => res
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| ClientError::Serde(e.to_string())),
            StatusCode::NOT_FOUND => Ok(None),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ClientError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        routing::get,
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::services::{
        clock::ManualClock,
        hanja_cache::NoPersistence,
        test_fixtures::{record, serve},
    };

    #[derive(Clone, Default)]
    struct Api {
        character_hits: Arc<AtomicUsize>,
        grade_hits: Arc<AtomicUsize>,
        failures_left: Arc<AtomicUsize>,
    }

    fn grade_ids() -> Vec<String> {
        (1..=12)
            .map(|n| format!("HJ-07-{n:04}-{:04X}", 0x4E00 + n))
            .collect()
    }

    async fn character(
        State(api): State<Api>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, StatusCode> {
        api.character_hits.fetch_add(1, Ordering::SeqCst);
        if api
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
        let parsed: utils::hanja_id::HanjaId = id.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
        if parsed.ordinal > 12 {
            return Err(StatusCode::NOT_FOUND);
        }
        let c = parsed.character().ok_or(StatusCode::BAD_REQUEST)?.to_string();
        Ok(Json(record(&id, &c, 7, parsed.ordinal, "뜻", "음")))
    }

    async fn grade(
        State(api): State<Api>,
        Path(grade): Path<u8>,
    ) -> Result<Json<Value>, StatusCode> {
        api.grade_hits.fetch_add(1, Ordering::SeqCst);
        if grade != 7 {
            return Err(StatusCode::NOT_FOUND);
        }
        let ids = grade_ids();
        Ok(Json(json!({
            "grade": 7,
            "name": "7급",
            "description": "7급 한자",
            "character_count": ids.len(),
            "character_ids": ids,
        })))
    }

    async fn client(api: Api) -> (HanjaClient, Arc<TwoTierCache>) {
        let base = serve(
            Router::new()
                .route("/api/hanja/{id}", get(character))
                .route("/api/grade/{grade}", get(grade))
                .with_state(api),
        )
        .await;
        let cache = Arc::new(TwoTierCache::new(
            Arc::new(NoPersistence),
            Arc::new(ManualClock::new(0)),
        ));
        (HanjaClient::new(base, cache.clone()).unwrap(), cache)
    }

    #[tokio::test]
    async fn characters_are_read_through_the_cache() {
        let api = Api::default();
        let (client, cache) = client(api.clone()).await;

        let first = client.character("HJ-07-0001-4E01").await.unwrap().unwrap();
        let second = client.character("HJ-07-0001-4E01").await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(api.character_hits.load(Ordering::SeqCst), 1);
        assert!(cache.get("character_HJ-07-0001-4E01").await.is_some());
    }

    #[tokio::test]
    async fn missing_characters_are_none_and_not_cached() {
        let api = Api::default();
        let (client, cache) = client(api.clone()).await;

        assert!(client.character("HJ-07-0099-4E63").await.unwrap().is_none());
        assert!(cache.get("character_HJ-07-0099-4E63").await.is_none());
    }

    #[tokio::test]
    async fn grade_fetch_prefetches_the_first_ten_characters() {
        let api = Api::default();
        let (client, cache) = client(api.clone()).await;

        let summary = client.grade(7).await.unwrap().unwrap();
        assert_eq!(summary.character_ids.len(), 12);
        assert_eq!(api.character_hits.load(Ordering::SeqCst), PREFETCH_COUNT);

        let ids = grade_ids();
        assert!(cache.get(&character_key(&ids[9])).await.is_some());
        assert!(cache.get(&character_key(&ids[10])).await.is_none());
        assert!(cache.get(&grade_key(7)).await.is_some());

        // Cached grade, already-prefetched characters: no more requests.
        client.grade(7).await.unwrap().unwrap();
        assert_eq!(api.grade_hits.load(Ordering::SeqCst), 1);
        assert_eq!(api.character_hits.load(Ordering::SeqCst), PREFETCH_COUNT);
    }

    #[tokio::test]
    async fn invalid_grades_short_circuit() {
        let api = Api::default();
        let (client, _) = client(api.clone()).await;

        assert!(client.grade(0).await.unwrap().is_none());
        assert!(client.grade(16).await.unwrap().is_none());
        assert_eq!(api.grade_hits.load(Ordering::SeqCst), 0);
        assert!(client.grade(3).await.unwrap().is_none());
        assert_eq!(api.grade_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let api = Api::default();
        api.failures_left.store(1, Ordering::SeqCst);
        let (client, _) = client(api.clone()).await;

        assert!(client.character("HJ-07-0002-4E02").await.unwrap().is_some());
        assert_eq!(api.character_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn persistent_server_errors_surface() {
        let api = Api::default();
        api.failures_left.store(10, Ordering::SeqCst);
        let (client, _) = client(api.clone()).await;

        let err = client.character("HJ-07-0002-4E02").await.unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 503, .. }));
        assert_eq!(api.character_hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        assert!(!ClientError::Serde("x".into()).should_retry());
        assert!(
            !ClientError::Http {
                status: 400,
                body: String::new()
            }
            .should_retry()
        );
        assert!(ClientError::Timeout.should_retry());
    }
}
