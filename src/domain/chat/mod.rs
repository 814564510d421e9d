//! Chat domain - Streamed assistant turns.
//!
//! Chunks, their SSE framing, and the client-side transcript they build.

mod chunk;
mod frame;
mod transcript;

pub use chunk::{ChatChunk, ChunkData, ChunkError, ChunkKind};
pub use frame::{encode_frame, FrameDecoder, FrameError, SseFrame, MAX_FRAME_BYTES};
pub use transcript::{
    CancelToken, ChatTranscript, MessageStatus, SharedTranscript, ToolResult, TranscriptMessage,
};
