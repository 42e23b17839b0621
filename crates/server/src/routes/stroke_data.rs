use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use deployment::Deployment;
use serde::Deserialize;
use utils::{
    hanja_id::{percent_decoded_char, single_char},
    response::{CachePolicy, Cached},
};

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct StrokeParams {
    #[serde(rename = "char")]
    pub character: Option<String>,
}

/// GET /api/stroke-data?char=<c>
pub async fn stroke_data(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<StrokeParams>,
) -> Result<Cached<Json<serde_json::Value>>, ApiError> {
    let raw = params
        .character
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing 'char' parameter".to_string()))?;
    let character = single_char(&raw)
        .or_else(|| percent_decoded_char(&raw))
        .ok_or_else(|| ApiError::BadRequest("'char' must be a single character".to_string()))?;

    // Every source failure is logged by the service and collapses into NotFound.
    let data = deployment
        .strokes()
        .fetch(character)
        .await
        .map_err(|e| ApiError::NotFound(e.to_string()))?;

    Ok(Cached(CachePolicy::StrokeData, Json((*data).clone())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/stroke-data", get(stroke_data))
}
