//! HTTP handlers for message processing, lead data and capabilities.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{CapabilityListResponse, RecordCapabilityRequest, SendMessageRequest};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::AppState;
use crate::application::handlers::capability::RecordCapabilityCommand;
use crate::application::handlers::conversation::{GetLeadQuery, ProcessMessageCommand};
use crate::domain::foundation::SessionId;

fn parse_session_id(raw: String) -> Result<SessionId, ApiError> {
    Ok(SessionId::parse(raw)?)
}

/// POST /api/sessions/:session_id/messages - Advance the stage for a message
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let session_id = parse_session_id(session_id)?;
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let result = state
        .process_message
        .handle(ProcessMessageCommand::new(session_id, req.content))
        .await?;
    Ok(Json(result).into_response())
}

/// GET /api/sessions/:session_id/lead - Current stage and lead data
pub async fn get_lead(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let session_id = parse_session_id(session_id)?;
    let record = state.get_lead.handle(GetLeadQuery { session_id }).await?;
    Ok(Json(record).into_response())
}

/// POST /api/sessions/:session_id/capabilities - Record a shown capability
pub async fn record_capability(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<RecordCapabilityRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(session_id)?;
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    state
        .capabilities
        .handle(RecordCapabilityCommand {
            session_id,
            name: req.name,
            metadata: req.metadata,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sessions/:session_id/capabilities - List shown capabilities
pub async fn list_capabilities(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CapabilityListResponse>, ApiError> {
    let session_id = parse_session_id(session_id)?;
    let capabilities = state.capabilities.list(&session_id).await?;
    Ok(Json(CapabilityListResponse {
        session_id: session_id.to_string(),
        capabilities,
    }))
}
