//! Per-session serialization of read-modify-write sequences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;

/// Map of per-session async mutexes.
///
/// Holding the guard returned by [`acquire`](Self::acquire) excludes every
/// other holder for the same session. Idle entries are pruned on acquire.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `session_id`.
    pub async fn acquire(&self, session_id: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|id, lock| id == session_id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(session_id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of sessions with a lock entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_is_serialized() {
        let locks = SessionLocks::new();
        let id = SessionId::parse("s").unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let locks = locks.clone();
                let id = id.clone();
                let active = active.clone();
                let max_active = max_active.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire(&id).await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_active.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_sessions_do_not_block_each_other() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(&SessionId::parse("a").unwrap()).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&SessionId::parse("b").unwrap()),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = SessionLocks::new();
        drop(locks.acquire(&SessionId::parse("a").unwrap()).await);
        drop(locks.acquire(&SessionId::parse("b").unwrap()).await);
        assert_eq!(locks.len(), 1);
    }
}
