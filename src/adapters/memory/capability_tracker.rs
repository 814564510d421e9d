//! In-Memory Capability Tracker Adapter

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::ports::{CapabilityRecord, CapabilityTracker, StoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCapabilityTracker {
    records: Arc<RwLock<HashMap<SessionId, Vec<CapabilityRecord>>>>,
}

impl InMemoryCapabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CapabilityTracker for InMemoryCapabilityTracker {
    async fn record(
        &self,
        session_id: &SessionId,
        record: CapabilityRecord,
    ) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .entry(session_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn list(&self, session_id: &SessionId) -> Result<Vec<CapabilityRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}
