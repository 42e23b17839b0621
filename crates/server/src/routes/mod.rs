use axum::Router;

use crate::DeploymentImpl;

pub mod grade;
pub mod hanja;
pub mod hanja_fallback;
pub mod health;
pub mod search;
pub mod stroke_data;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api = Router::new()
        .merge(grade::router(&deployment))
        .merge(hanja::router(&deployment))
        .merge(hanja_fallback::router(&deployment))
        .merge(search::router(&deployment))
        .merge(stroke_data::router(&deployment));

    Router::new()
        .merge(health::router(&deployment))
        .nest("/api", api)
        .with_state(deployment)
}
