//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod capability;
pub mod chat;
pub mod conversation;
pub mod session;
