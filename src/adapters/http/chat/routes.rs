//! HTTP routes for the streaming chat endpoint.

use axum::{routing::post, Router};

use super::handlers::stream_chat;
use crate::adapters::http::AppState;

/// Creates the chat router.
///
/// # Routes
///
/// - `POST /api/chat` - Stream an assistant turn (`text/event-stream`)
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/chat", post(stream_chat))
}
