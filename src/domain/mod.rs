//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `lead` - Conversation stages, signal extraction and the lead profile
//! - `chat` - Streamed chat chunks, SSE framing and the client transcript

pub mod chat;
pub mod foundation;
pub mod lead;
