//! HTTP handlers for the streaming chat endpoint.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use futures::StreamExt;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::headers::session_id_header;
use crate::adapters::http::AppState;
use crate::application::handlers::chat::{ChatRequest, StreamChatCommand};
use crate::domain::chat::encode_frame;

/// POST /api/chat - Stream one assistant turn as Server-Sent Events
///
/// Request problems answer 500 with an error body. Once streaming starts,
/// failures arrive as a terminal `error` event.
pub async fn stream_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Internal(e.body_text()))?;
    let session_id = session_id_header(&headers)?;

    let chunks = state
        .stream_chat
        .handle(StreamChatCommand {
            session_id,
            request,
        })
        .await?;

    let frames = chunks.map(|chunk| encode_frame(&chunk));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(frames))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
