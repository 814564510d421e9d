//! Application router assembly.

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::chat::chat_routes;
use super::headers::{IDEMPOTENCY_KEY_HEADER, SESSION_ID_HEADER};
use super::lead::lead_routes;
use super::session::session_routes;
use super::AppState;
use crate::config::ServerConfig;

/// GET /health - Liveness
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the full API router.
///
/// Every response carries an `x-request-id`, generated when the caller did
/// not send one, and the trace span sees it.
pub fn app_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(session_routes())
        .merge(chat_routes())
        .merge(lead_routes())
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(server))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// CORS for the configured origins.
///
/// Without configured origins, development allows any origin and other
/// environments allow none.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let session_header = HeaderName::from_static(SESSION_ID_HEADER);
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            session_header.clone(),
            HeaderName::from_static(IDEMPOTENCY_KEY_HEADER),
        ])
        .expose_headers([session_header]);

    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if !origins.is_empty() {
        base.allow_origin(AllowOrigin::list(origins))
    } else if server.is_production() {
        base
    } else {
        base.allow_origin(AllowOrigin::any())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::enrichment::MockEnrichmentProvider;
    use crate::adapters::http::StateSettings;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::in_memory(
            Arc::new(MockAIProvider::new()),
            Arc::new(MockEnrichmentProvider::new()),
            StateSettings::default(),
        );
        app_router(state, &ServerConfig::default())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn request_id_is_generated_or_propagated() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_exposes_session_header() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/session/init")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
