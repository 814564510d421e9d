//! HTTP routes for per-session lead endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_lead, list_capabilities, record_capability, send_message};
use crate::adapters::http::AppState;

/// Creates the lead router.
///
/// # Routes
///
/// - `POST /api/sessions/:session_id/messages` - Process a visitor message
/// - `GET /api/sessions/:session_id/lead` - Current stage and lead data
/// - `POST /api/sessions/:session_id/capabilities` - Record a capability
/// - `GET /api/sessions/:session_id/capabilities` - List capabilities
pub fn lead_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions/:session_id/messages", post(send_message))
        .route("/api/sessions/:session_id/lead", get(get_lead))
        .route(
            "/api/sessions/:session_id/capabilities",
            post(record_capability).get(list_capabilities),
        )
}
