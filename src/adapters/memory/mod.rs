//! In-memory persistence adapters.
//!
//! Back the persistence ports with process-local maps. Used by the binary
//! until a durable store is wired in, and by tests.

mod capability_tracker;
mod context_store;
mod lead_repository;

pub use capability_tracker::InMemoryCapabilityTracker;
pub use context_store::InMemoryContextStore;
pub use lead_repository::InMemoryLeadRepository;
