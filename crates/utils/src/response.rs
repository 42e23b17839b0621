//! Response shaping shared by every route: cache policy and CORS headers.

use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// `Cache-Control` policy per endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Search results, 5 minutes.
    Search,
    /// Character and grade lookups, 1 hour.
    Lookup,
    /// Glyph SVGs, 24 hours.
    Svg,
    /// Stroke animation data, one week then revalidate.
    StrokeData,
    NoStore,
}

impl CachePolicy {
    pub fn header_value(self) -> &'static str {
        match self {
            CachePolicy::Search => "public, max-age=300",
            CachePolicy::Lookup => "public, max-age=3600",
            CachePolicy::Svg => "public, max-age=86400",
            CachePolicy::StrokeData => "public, max-age=604800, must-revalidate",
            CachePolicy::NoStore => "no-store",
        }
    }
}

/// Wraps a successful response with `Cache-Control` and permissive CORS headers.
pub struct Cached<T>(pub CachePolicy, pub T);

impl<T: IntoResponse> IntoResponse for Cached<T> {
    fn into_response(self) -> Response {
        let Cached(policy, inner) = self;
        let mut response = inner.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(policy.header_value()),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        );
        response
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ErrorBody {
    pub error: String,
    /// Present on search failures so clients can always read `results`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<()>>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            results: None,
        }
    }

    pub fn with_empty_results(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            results: Some(Vec::new()),
        }
    }
}
