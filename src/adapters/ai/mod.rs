//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Scripted token streams for tests and local runs

mod mock_provider;

pub use mock_provider::{tool_unit, MockAIProvider, MockError, MockResponse};
