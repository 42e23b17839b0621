use axum::{
    Router,
    http::{Method, header},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod routes;

pub type DeploymentImpl = deployment::LocalDeployment;

/// Full application: every route plus request tracing and CORS preflight handling.
pub fn build_router(deployment: DeploymentImpl) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    routes::router(deployment)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
