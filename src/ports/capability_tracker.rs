//! Capability Tracker Port - Which capabilities a visitor has been shown.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context_store::StoreError;
use crate::domain::foundation::{SessionId, Timestamp};

/// A capability demonstrated during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub recorded_at: Timestamp,
}

impl CapabilityRecord {
    pub fn new(name: impl Into<String>, metadata: Option<Value>) -> Self {
        Self {
            name: name.into(),
            metadata,
            recorded_at: Timestamp::now(),
        }
    }
}

/// Port for capability usage tracking.
#[async_trait]
pub trait CapabilityTracker: Send + Sync {
    async fn record(
        &self,
        session_id: &SessionId,
        record: CapabilityRecord,
    ) -> Result<(), StoreError>;

    /// Records in the order they were made.
    async fn list(&self, session_id: &SessionId) -> Result<Vec<CapabilityRecord>, StoreError>;
}
