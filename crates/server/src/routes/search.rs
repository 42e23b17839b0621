use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use db::models::character::CharacterRecord;
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::{CachePolicy, Cached};

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct SearchResponse {
    pub results: Vec<CharacterRecord>,
    pub count: usize,
    pub query: String,
}

/// GET /api/search?q=<text>
pub async fn search(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<SearchParams>,
) -> Result<Cached<Json<SearchResponse>>, ApiError> {
    // Blank means whitespace only; a non-blank query is used as sent.
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidQuery("search query is required".to_string()))?;

    let results = deployment.search().search(&query).await;
    tracing::debug!(query = %query, count = results.len(), "search");

    Ok(Cached(
        CachePolicy::Search,
        Json(SearchResponse {
            count: results.len(),
            results,
            query,
        }),
    ))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/search", get(search))
}
