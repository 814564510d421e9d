//! In-flight request coordinator.
//!
//! Collapses concurrent requests for the same key onto one unit of work.
//! The first caller for a key spawns the work; everyone arriving while it is
//! pending gets a clone of the same shared result. The entry is removed when
//! the work settles, whether it succeeded, failed or panicked, so the next
//! request for the key starts fresh.
//!
//! Work runs as its own task. A caller that stops waiting (timeout, dropped
//! request) does not cancel it.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

/// Shared, cloneable handle to the result of in-flight work.
pub type SharedResult<T> = Shared<BoxFuture<'static, Result<T, InFlightError>>>;

/// Errors seen by callers waiting on coordinated work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InFlightError {
    /// The work panicked or was aborted before producing a value.
    #[error("in-flight work for '{0}' was aborted")]
    Aborted(String),

    /// This caller stopped waiting; the work itself continues.
    #[error("gave up waiting for '{key}' after {after:?}")]
    TimedOut { key: String, after: Duration },

    /// The coordinator no longer accepts work.
    #[error("coordinator is shut down")]
    ShutDown,
}

struct Entry<T: Clone> {
    id: u64,
    result: SharedResult<T>,
    abort: AbortHandle,
}

struct Inner<T: Clone> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    next_id: AtomicU64,
    shut_down: AtomicBool,
}

impl<T: Clone> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the entry it was created for when dropped.
///
/// Lives inside the spawned task, so it runs on completion, panic and abort.
struct ReleaseGuard<T: Clone> {
    inner: Arc<Inner<T>>,
    key: String,
    id: u64,
}

impl<T: Clone> Drop for ReleaseGuard<T> {
    fn drop(&mut self) {
        let mut entries = self.inner.lock();
        if entries.get(&self.key).map(|e| e.id) == Some(self.id) {
            entries.remove(&self.key);
        }
    }
}

/// Per-key deduplication of concurrent work.
pub struct InFlightCoordinator<T: Clone> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone> Clone for InFlightCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> std::fmt::Debug for InFlightCoordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightCoordinator")
            .field("in_flight", &self.inner.lock().len())
            .field("shut_down", &self.inner.shut_down.load(Ordering::SeqCst))
            .finish()
    }
}

impl<T> Default for InFlightCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InFlightCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Joins pending work for `key`, or starts it with `factory`.
    ///
    /// `factory` is only invoked when no work for `key` is pending. Lookup,
    /// registration and spawn happen under one lock, so two callers can
    /// never both start work for the same key.
    pub fn submit<F, Fut>(&self, key: impl Into<String>, factory: F) -> SharedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let key = key.into();
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return futures::future::ready(Err(InFlightError::ShutDown))
                .boxed()
                .shared();
        }

        let mut entries = self.inner.lock();
        if let Some(entry) = entries.get(&key) {
            tracing::debug!(key = %key, "Joining in-flight work");
            return entry.result.clone();
        }

        // Before the guard exists: a panicking factory must not run the
        // guard's release while this thread still holds `entries`.
        let work = factory();
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let guard = ReleaseGuard {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
            id,
        };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });
        let abort = handle.abort_handle();

        let failed_key = key.clone();
        let result: SharedResult<T> = async move {
            handle.await.map_err(|err| {
                if err.is_panic() {
                    tracing::error!(key = %failed_key, "In-flight work panicked");
                }
                InFlightError::Aborted(failed_key)
            })
        }
        .boxed()
        .shared();

        tracing::debug!(key = %key, "Started in-flight work");
        entries.insert(
            key,
            Entry {
                id,
                result: result.clone(),
                abort,
            },
        );
        result
    }

    /// Like [`submit`](Self::submit), but this caller waits at most `timeout`.
    ///
    /// On timeout only the wait is abandoned; the work keeps running and
    /// still cleans up after itself.
    pub async fn submit_with_timeout<F, Fut>(
        &self,
        key: impl Into<String>,
        timeout: Duration,
        factory: F,
    ) -> Result<T, InFlightError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let key = key.into();
        let result = self.submit(key.clone(), factory);
        match tokio::time::timeout(timeout, result).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(key = %key, timeout_ms = timeout.as_millis() as u64, "Stopped waiting for in-flight work");
                Err(InFlightError::TimedOut { key, after: timeout })
            }
        }
    }

    /// Returns true if work for `key` is pending.
    pub fn in_flight(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Number of pending keys.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aborts all pending work and refuses new submissions.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        let drained: Vec<(String, Entry<T>)> = self.inner.lock().drain().collect();
        for (key, entry) in drained {
            tracing::info!(key = %key, "Aborting in-flight work on shutdown");
            entry.abort.abort();
        }
    }
}
