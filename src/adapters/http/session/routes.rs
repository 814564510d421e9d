//! HTTP routes for session endpoints.

use axum::{routing::post, Router};

use super::handlers::init_session;
use crate::adapters::http::AppState;

/// Creates the session router.
///
/// # Routes
///
/// - `POST /api/session/init` - Initialize or resume a session
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/session/init", post(init_session))
}
