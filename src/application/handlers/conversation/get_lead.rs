//! GetLeadHandler - Query handler for a session's stage and lead data.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::lead::LeadRecord;
use crate::ports::{LeadRepository, StoreError};

/// Query to get the lead record of a session.
#[derive(Debug, Clone)]
pub struct GetLeadQuery {
    pub session_id: SessionId,
}

/// Handler for retrieving lead records.
pub struct GetLeadHandler {
    leads: Arc<dyn LeadRepository>,
}

impl GetLeadHandler {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self { leads }
    }

    /// Returns `Err(StoreError::NotFound)` for sessions without a record.
    pub async fn handle(&self, query: GetLeadQuery) -> Result<LeadRecord, StoreError> {
        self.leads
            .find(&query.session_id)
            .await?
            .ok_or(StoreError::NotFound(query.session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLeadRepository;

    #[tokio::test]
    async fn returns_stored_record() {
        let repo = Arc::new(InMemoryLeadRepository::new());
        let session_id = SessionId::parse("q-1").unwrap();
        repo.save(&LeadRecord::new(session_id.clone())).await.unwrap();

        let handler = GetLeadHandler::new(repo);
        let record = handler
            .handle(GetLeadQuery {
                session_id: session_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(record.session_id, session_id);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let handler = GetLeadHandler::new(Arc::new(InMemoryLeadRepository::new()));
        let result = handler
            .handle(GetLeadQuery {
                session_id: SessionId::parse("missing").unwrap(),
            })
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
