//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use leadflow::adapters::ai::MockAIProvider;
use leadflow::adapters::enrichment::MockEnrichmentProvider;
use leadflow::adapters::http::{app_router, AppState, StateSettings};
use leadflow::config::ServerConfig;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub enrichment: Arc<MockEnrichmentProvider>,
    pub ai: Arc<MockAIProvider>,
}

pub fn app_with(ai: MockAIProvider, enrichment: MockEnrichmentProvider) -> TestApp {
    let ai = Arc::new(ai);
    let enrichment = Arc::new(enrichment);
    let state = AppState::in_memory(
        ai.clone(),
        enrichment.clone(),
        StateSettings {
            enrichment_wait: Duration::from_secs(5),
            ..Default::default()
        },
    );
    let router = app_router(state.clone(), &ServerConfig::default());
    TestApp {
        router,
        state,
        enrichment,
        ai,
    }
}

pub fn app() -> TestApp {
    app_with(MockAIProvider::new(), MockEnrichmentProvider::new())
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
