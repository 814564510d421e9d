//! RecordCapabilityHandler - Tracks capabilities shown to a visitor.
//!
//! The tracker is the record of truth. The context's `capabilities_shown`
//! set is a best-effort mirror used when building prompts.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::foundation::{SessionId, ValidationError};
use crate::domain::lead::ContextPatch;
use crate::ports::{CapabilityRecord, CapabilityTracker, ContextStore, StoreError};

/// Command to record a capability.
#[derive(Debug, Clone)]
pub struct RecordCapabilityCommand {
    pub session_id: SessionId,
    pub name: String,
    pub metadata: Option<Value>,
}

/// Errors recording a capability.
#[derive(Debug, thiserror::Error)]
pub enum RecordCapabilityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("capability tracking failed: {0}")]
    Store(#[from] StoreError),
}

pub struct RecordCapabilityHandler {
    tracker: Arc<dyn CapabilityTracker>,
    contexts: Arc<dyn ContextStore>,
}

impl RecordCapabilityHandler {
    pub fn new(tracker: Arc<dyn CapabilityTracker>, contexts: Arc<dyn ContextStore>) -> Self {
        Self { tracker, contexts }
    }

    pub async fn handle(&self, cmd: RecordCapabilityCommand) -> Result<(), RecordCapabilityError> {
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }

        self.tracker
            .record(&cmd.session_id, CapabilityRecord::new(name, cmd.metadata))
            .await?;

        match self
            .contexts
            .update(&cmd.session_id, ContextPatch::default().with_capability(name))
            .await
        {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(session_id = %cmd.session_id, "No context to mirror capability into");
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %cmd.session_id,
                    capability = %name,
                    error = %err,
                    "Failed to mirror capability into context"
                );
            }
        }
        Ok(())
    }

    pub async fn list(&self, session_id: &SessionId) -> Result<Vec<CapabilityRecord>, StoreError> {
        self.tracker.list(session_id).await
    }
}
