//! Streaming chat handlers.

mod stream_chat;

pub use stream_chat::{
    ChatRequest, ChunkStream, StreamChatCommand, StreamChatConfig, StreamChatError,
    StreamChatHandler, CHAT_PROTOCOL_VERSION,
};
