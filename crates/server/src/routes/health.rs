use axum::{Json, Router, extract::State, routing::get};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::{CachePolicy, Cached};

use crate::DeploymentImpl;

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health(State(deployment): State<DeploymentImpl>) -> Cached<Json<HealthResponse>> {
    Cached(
        CachePolicy::NoStore,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: deployment.version().to_string(),
        }),
    )
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/health", get(health))
}
