//! Lead Repository Port - Persistence of stage and lead data per session.

use async_trait::async_trait;

use super::context_store::StoreError;
use crate::domain::foundation::SessionId;
use crate::domain::lead::LeadRecord;

/// Port for reading and writing lead records.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Finds the record for a session.
    async fn find(&self, session_id: &SessionId) -> Result<Option<LeadRecord>, StoreError>;

    /// Inserts or replaces a record.
    async fn save(&self, record: &LeadRecord) -> Result<(), StoreError>;

    /// Records the visitor's identity, creating the record if needed.
    ///
    /// A `None` name leaves a stored name untouched.
    async fn upsert_identity(
        &self,
        session_id: &SessionId,
        email: &str,
        name: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Removes the record. Deleting a missing record is not an error.
    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError>;
}
