//! In-Memory Lead Repository Adapter

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::lead::LeadRecord;
use crate::ports::{LeadRepository, StoreError};

/// In-memory storage for lead records
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeadRepository {
    records: Arc<RwLock<HashMap<SessionId, LeadRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with `StoreError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("lead repository writes disabled"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn find(&self, session_id: &SessionId) -> Result<Option<LeadRecord>, StoreError> {
        Ok(self.records.read().await.get(session_id).cloned())
    }

    async fn save(&self, record: &LeadRecord) -> Result<(), StoreError> {
        self.check_writable()?;
        self.records
            .write()
            .await
            .insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    async fn upsert_identity(
        &self,
        session_id: &SessionId,
        email: &str,
        name: Option<&str>,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let record = records
            .entry(session_id.clone())
            .or_insert_with(|| LeadRecord::new(session_id.clone()));
        record.lead.email = Some(email.to_string());
        if let Some(name) = name {
            record.lead.name = Some(name.to_string());
        }
        record.lead.lead_score = record.lead.compute_lead_score();
        record.touch();
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.check_writable()?;
        self.records.write().await.remove(session_id);
        Ok(())
    }
}
