//! Server-Sent Events framing for chat chunks.
//!
//! Frames are `event: <type>\ndata: <json>\n\n`. The decoder is incremental:
//! bytes may arrive split anywhere, including inside a multi-byte UTF-8
//! character, and a frame is only yielded once its terminating blank line
//! has been seen.

use thiserror::Error;

use super::chunk::ChatChunk;

/// Upper bound on a single buffered frame.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Errors from encoding or decoding frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame exceeds {MAX_FRAME_BYTES} bytes")]
    FrameTooLarge,

    #[error("frame is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("invalid chunk payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("stream ended inside a frame")]
    Truncated,
}

/// A decoded SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    /// Parses the frame payload as a chat chunk.
    pub fn to_chunk(&self) -> Result<ChatChunk, FrameError> {
        Ok(serde_json::from_str(&self.data)?)
    }
}

/// Encodes a chunk as one SSE frame.
pub fn encode_frame(chunk: &ChatChunk) -> Result<String, FrameError> {
    let data = serde_json::to_string(chunk)?;
    Ok(format!("event: {}\ndata: {}\n\n", chunk.kind(), data))
}

/// Incremental SSE frame decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds bytes and returns every frame they complete.
    ///
    /// Comment-only frames (keep-alives) are dropped.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<SseFrame>, FrameError> {
        // 0x0D never occurs inside a multi-byte UTF-8 sequence.
        self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_frame(&raw[..end])? {
                frames.push(frame);
            }
        }

        if self.buffer.len() > MAX_FRAME_BYTES {
            self.buffer.clear();
            return Err(FrameError::FrameTooLarge);
        }
        Ok(frames)
    }

    /// Checks that the stream ended on a frame boundary.
    pub fn finish(self) -> Result<(), FrameError> {
        if self.buffer.iter().all(|b| b.is_ascii_whitespace()) {
            Ok(())
        } else {
            Err(FrameError::Truncated)
        }
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_frame(raw: &[u8]) -> Result<Option<SseFrame>, FrameError> {
    let text = std::str::from_utf8(raw)?;
    let mut event = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return Ok(None);
    }
    Ok(Some(SseFrame {
        event,
        data: data_lines.join("\n"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::ChunkData;
    use crate::domain::foundation::MessageId;

    fn text_chunk(seq: u64, text: &str) -> ChatChunk {
        ChatChunk::new(MessageId::new(), seq, ChunkData::Text(text.to_string()))
    }

    #[test]
    fn encodes_event_and_data_lines() {
        let frame = encode_frame(&ChatChunk::new(MessageId::new(), 0, ChunkData::Done)).unwrap();
        assert!(frame.starts_with("event: done\ndata: {"));
        assert!(frame.ends_with("}\n\n"));
    }

    #[test]
    fn decodes_frames_split_at_every_byte() {
        let chunks = vec![text_chunk(0, "héllo wörld ✓"), text_chunk(1, "again")];
        let bytes: Vec<u8> = chunks
            .iter()
            .map(|c| encode_frame(c).unwrap())
            .collect::<String>()
            .into_bytes();

        let mut decoder = FrameDecoder::new();
        let mut decoded = Vec::new();
        for byte in &bytes {
            for frame in decoder.push(std::slice::from_ref(byte)).unwrap() {
                decoded.push(frame.to_chunk().unwrap());
            }
        }
        decoder.finish().unwrap();
        assert_eq!(decoded, chunks);
    }

    #[test]
    fn skips_keep_alive_comments() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder
            .push(b": keep-alive\n\nevent: text\ndata: {\"x\":1}\n\n")
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("text"));
        assert_eq!(frames[0].data, "{\"x\":1}");
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(b"event: done\r\ndata: {}\r\n\r\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{}");
    }

    #[test]
    fn joins_multiple_data_lines() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(b"data: a\ndata: b\n\n").unwrap();
        assert_eq!(frames[0].data, "a\nb");
        assert_eq!(frames[0].event, None);
    }

    #[test]
    fn holds_incomplete_frame_until_terminated() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"event: text\ndata: {}\n").unwrap().is_empty());
        assert_eq!(decoder.push(b"\n").unwrap().len(), 1);
    }

    #[test]
    fn truncated_stream_is_reported() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"event: text\ndata: {").unwrap();
        assert!(matches!(decoder.finish(), Err(FrameError::Truncated)));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut decoder = FrameDecoder::new();
        let big = vec![b'a'; MAX_FRAME_BYTES + 1];
        assert!(matches!(decoder.push(&big), Err(FrameError::FrameTooLarge)));
    }
}
