//! In-Memory Context Store Adapter
//!
//! Keeps conversation contexts in a map. Used by the binary and in tests;
//! writes can be switched to fail to exercise error paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::lead::{ContextPatch, ConversationContext};
use crate::ports::{ContextStore, StoreError};

/// In-memory storage for conversation contexts
#[derive(Debug, Clone, Default)]
pub struct InMemoryContextStore {
    contexts: Arc<RwLock<HashMap<SessionId, ConversationContext>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryContextStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with `StoreError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Get the number of stored contexts
    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.read().await.is_empty()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.contexts.write().await.clear();
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("context store writes disabled"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn get(&self, session_id: &SessionId) -> Result<Option<ConversationContext>, StoreError> {
        Ok(self.contexts.read().await.get(session_id).cloned())
    }

    async fn store(
        &self,
        session_id: &SessionId,
        patch: ContextPatch,
    ) -> Result<ConversationContext, StoreError> {
        self.check_writable()?;
        let mut contexts = self.contexts.write().await;
        let context = contexts
            .entry(session_id.clone())
            .or_insert_with(|| ConversationContext::new(session_id.clone()));
        context.apply(patch);
        Ok(context.clone())
    }

    async fn update(
        &self,
        session_id: &SessionId,
        patch: ContextPatch,
    ) -> Result<ConversationContext, StoreError> {
        self.check_writable()?;
        let mut contexts = self.contexts.write().await;
        let context = contexts
            .get_mut(session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.clone()))?;
        context.apply(patch);
        Ok(context.clone())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.check_writable()?;
        self.contexts.write().await.remove(session_id);
        Ok(())
    }
}
