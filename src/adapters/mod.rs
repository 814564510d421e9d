//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to the outside world:
//! - `memory` - In-process persistence for contexts, leads and capabilities
//! - `enrichment` - Background research providers (HTTP, mock)
//! - `ai` - Text generation providers (mock)
//! - `http` - axum routes, error mapping and shared state
//! - `chat_client` - Streaming chat client with per-conversation cancellation

pub mod ai;
pub mod chat_client;
pub mod enrichment;
pub mod http;
pub mod memory;
