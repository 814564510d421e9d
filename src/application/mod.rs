//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! The in-flight coordinator and per-session locks are the shared
//! concurrency primitives the handlers are built on.

pub mod handlers;
pub mod in_flight;
pub mod session_locks;

pub use handlers::capability::{RecordCapabilityCommand, RecordCapabilityHandler};
pub use handlers::chat::{StreamChatCommand, StreamChatHandler};
pub use handlers::conversation::{GetLeadHandler, ProcessMessageCommand, ProcessMessageHandler};
pub use handlers::session::{InitSessionCommand, InitSessionHandler};
pub use in_flight::{InFlightCoordinator, InFlightError};
pub use session_locks::SessionLocks;
