#![allow(dead_code)]

//! Request helpers for the API tests over the services crate's seeded corpus.

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use db::DataLayout;
use deployment::{Deployment, DeploymentConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use server::{DeploymentImpl, build_router};
pub use services::services::test_fixtures::{GLYPH_SVG, serve, write_json};
use services::services::test_fixtures::seed;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub layout: DataLayout,
    _dir: TempDir,
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// App over a freshly seeded temp directory. `configure` may point stroke
/// data at a local stand-in.
pub async fn test_app_with(configure: impl FnOnce(&mut DeploymentConfig)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let layout = seed(dir.path());

    let mut config = DeploymentConfig::new(dir.path().join("data"), dir.path().join("public"));
    config.stroke_sources = vec!["http://127.0.0.1:9".to_string()];
    configure(&mut config);

    let deployment = DeploymentImpl::new(config).await.unwrap();
    TestApp {
        router: build_router(deployment),
        layout,
        _dir: dir,
    }
}

pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
