//! HTTP handlers for session endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{InitSessionRequest, InitSessionResponse};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::headers::{
    header_str, IDEMPOTENCY_KEY_HEADER, SESSION_ID_HEADER,
};
use crate::adapters::http::AppState;
use crate::application::handlers::session::InitSessionCommand;

/// POST /api/session/init - Create or resume a session and kick off research
pub async fn init_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<InitSessionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let cmd = InitSessionCommand {
        session_id: req.session_id,
        header_session_id: header_str(&headers, SESSION_ID_HEADER).map(str::to_string),
        idempotency_key: header_str(&headers, IDEMPOTENCY_KEY_HEADER).map(str::to_string),
        email: req.email,
        name: req.name,
        company_url: req.company_url,
    };

    let result = state.init_session.handle(cmd).await?;
    let session_header = HeaderValue::from_str(result.session_id.as_str())
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [(HeaderName::from_static(SESSION_ID_HEADER), session_header)],
        Json(InitSessionResponse::from(result)),
    )
        .into_response())
}
