use axum::{
    Router,
    extract::{Query, State},
    http::header,
    routing::get,
};
use deployment::Deployment;
use serde::Deserialize;
use utils::response::{CachePolicy, Cached};

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct FallbackParams {
    pub hanja: Option<String>,
}

/// GET /api/hanja-fallback?hanja=<c>
///
/// Serves the stored glyph SVG, or a generated placeholder showing the text.
pub async fn hanja_fallback(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<FallbackParams>,
) -> Result<Cached<([(header::HeaderName, &'static str); 1], String)>, ApiError> {
    let hanja = params
        .hanja
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing 'hanja' parameter".to_string()))?;

    let glyph = deployment.glyphs().glyph(&hanja).await;
    if glyph.placeholder {
        tracing::debug!(hanja = %hanja, "serving placeholder glyph");
    }

    Ok(Cached(
        CachePolicy::Svg,
        ([(header::CONTENT_TYPE, "image/svg+xml")], glyph.svg),
    ))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/hanja-fallback", get(hanja_fallback))
}
