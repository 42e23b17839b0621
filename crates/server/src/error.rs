use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::id_map::IdMapError;
use thiserror::Error;
use utils::response::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    /// Search validation failures; the body keeps an empty `results` list.
    #[error("{0}")]
    InvalidQuery(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    IdMap(#[from] IdMapError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::IdMap(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::InvalidQuery(msg) => ErrorBody::with_empty_results(msg.clone()),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => ErrorBody::new(msg.clone()),
            ApiError::IdMap(e) => {
                tracing::error!(error = %e, "request failed");
                ErrorBody::new("Internal server error")
            }
        };
        (status, Json(body)).into_response()
    }
}
