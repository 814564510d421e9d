//! Context Store Port - Persistence of conversation contexts.
//!
//! Contexts are keyed by session id. Writes take a [`ContextPatch`]; fields
//! absent from the patch are never touched.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::lead::{ContextPatch, ConversationContext};

/// Errors from context persistence.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("No record for session: {0}")]
    NotFound(SessionId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Port for reading and writing conversation contexts.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Fetches the context for a session.
    async fn get(&self, session_id: &SessionId) -> Result<Option<ConversationContext>, StoreError>;

    /// Creates the context if absent, otherwise merges the patch into it.
    async fn store(
        &self,
        session_id: &SessionId,
        patch: ContextPatch,
    ) -> Result<ConversationContext, StoreError>;

    /// Merges the patch into an existing context.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session has no context.
    async fn update(
        &self,
        session_id: &SessionId,
        patch: ContextPatch,
    ) -> Result<ConversationContext, StoreError>;

    /// Removes the context. Deleting a missing context is not an error.
    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError>;
}
