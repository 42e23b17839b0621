use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use db::models::grade::GradeSummary;
use deployment::Deployment;
use utils::{
    hanja_id::parse_grade,
    response::{CachePolicy, Cached},
};

use crate::{DeploymentImpl, error::ApiError};

pub const INVALID_GRADE: &str = "invalid grade: expected an integer between 1-15";

/// GET /api/grade/{grade}
pub async fn get_grade(
    State(deployment): State<DeploymentImpl>,
    Path(grade): Path<String>,
) -> Result<Cached<Json<GradeSummary>>, ApiError> {
    let grade = parse_grade(&grade).ok_or_else(|| ApiError::BadRequest(INVALID_GRADE.to_string()))?;

    let summary = deployment
        .grade_summaries()
        .summary(grade)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no data for grade {grade}")))?;

    Ok(Cached(CachePolicy::Lookup, Json(summary)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/grade/{grade}", get(get_grade))
}
