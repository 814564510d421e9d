//! Streaming chat client.
//!
//! Posts a chat request, decodes the Server-Sent Events reply and grows the
//! assistant message in a shared transcript until a terminal chunk arrives.

mod client;
mod reader;

pub use client::ChatStreamClient;
pub use reader::{read_turn, TurnOutcome};

use crate::domain::chat::FrameError;

/// Errors from the chat client.
#[derive(Debug, thiserror::Error)]
pub enum ChatClientError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("stream ended without a terminal chunk")]
    Incomplete,
}
