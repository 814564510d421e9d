//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": "<message>"}` with a status
//! chosen from the error's layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::handlers::capability::RecordCapabilityError;
use crate::application::handlers::chat::StreamChatError;
use crate::application::handlers::conversation::ProcessMessageError;
use crate::application::handlers::session::InitSessionError;
use crate::domain::foundation::ValidationError;
use crate::ports::StoreError;

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Session not found: {}", id)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<InitSessionError> for ApiError {
    fn from(err: InitSessionError) -> Self {
        match err {
            InitSessionError::Validation(e) => e.into(),
            InitSessionError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ProcessMessageError> for ApiError {
    fn from(err: ProcessMessageError) -> Self {
        match err {
            ProcessMessageError::Validation(e) => e.into(),
            ProcessMessageError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<RecordCapabilityError> for ApiError {
    fn from(err: RecordCapabilityError) -> Self {
        match err {
            RecordCapabilityError::Validation(e) => e.into(),
            RecordCapabilityError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// Chat request problems are reported as 500, matching what chat widgets
/// already handle.
impl From<StreamChatError> for ApiError {
    fn from(err: StreamChatError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
