//! HTTP DTOs for lead endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::CapabilityRecord;

/// Request to process a visitor message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Request to record a capability.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordCapabilityRequest {
    pub name: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Capabilities recorded for a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityListResponse {
    pub session_id: String,
    pub capabilities: Vec<CapabilityRecord>,
}
