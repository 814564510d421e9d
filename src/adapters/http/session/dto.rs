//! HTTP DTOs for session endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::session::InitSessionResult;
use crate::domain::lead::ResearchSnapshot;

/// Request to initialize a session.
///
/// `email` is optional here so a missing value reaches validation and gets
/// the standard error body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitSessionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_url: Option<String>,
}

/// Response for session initialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitSessionResponse {
    pub session_id: String,
    pub context_ready: bool,
    pub snapshot: Option<ResearchSnapshot>,
}

impl From<InitSessionResult> for InitSessionResponse {
    fn from(result: InitSessionResult) -> Self {
        Self {
            session_id: result.session_id.to_string(),
            context_ready: result.context_ready,
            snapshot: result.snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;

    #[test]
    fn request_deserializes_camel_case() {
        let json = r#"{"sessionId": "s-1", "email": "a@b.com", "companyUrl": "https://b.com"}"#;
        let req: InitSessionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.session_id.as_deref(), Some("s-1"));
        assert_eq!(req.company_url.as_deref(), Some("https://b.com"));
        assert!(req.name.is_none());
    }

    #[test]
    fn empty_body_deserializes() {
        let req: InitSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.email.is_none());
    }

    #[test]
    fn response_serializes_null_snapshot() {
        let response = InitSessionResponse::from(InitSessionResult {
            session_id: SessionId::parse("s-1").unwrap(),
            context_ready: false,
            snapshot: None,
        });
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"sessionId": "s-1", "contextReady": false, "snapshot": null})
        );
    }
}
