//! Chat chunks streamed for one assistant turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::MessageId;

/// Payload of a chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkData {
    /// A text fragment to append to the message.
    Text(String),
    /// Result of a tool invocation.
    Tool { name: String, output: Value },
    /// The turn finished normally.
    Done,
    /// The turn failed; no more chunks follow.
    Error(String),
}

/// Discriminant of [`ChunkData`], used as the SSE event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Text,
    Tool,
    Done,
    Error,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Text => "text",
            ChunkKind::Tool => "tool",
            ChunkKind::Done => "done",
            ChunkKind::Error => "error",
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordered unit of a streamed assistant turn.
///
/// Serialized as `{"id", "seq", "type", "data"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireChunk", into = "WireChunk")]
pub struct ChatChunk {
    /// Message the chunk belongs to; constant for a turn.
    pub id: MessageId,
    /// Position within the turn, starting at 0.
    pub seq: u64,
    pub data: ChunkData,
}

impl ChatChunk {
    pub fn new(id: MessageId, seq: u64, data: ChunkData) -> Self {
        Self { id, seq, data }
    }

    pub fn kind(&self) -> ChunkKind {
        match self.data {
            ChunkData::Text(_) => ChunkKind::Text,
            ChunkData::Tool { .. } => ChunkKind::Tool,
            ChunkData::Done => ChunkKind::Done,
            ChunkData::Error(_) => ChunkKind::Error,
        }
    }

    /// Returns true for `done` and `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, ChunkData::Done | ChunkData::Error(_))
    }
}

/// Errors converting a wire chunk into a [`ChatChunk`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk of type '{0}' is missing its data")]
    MissingData(ChunkKind),

    #[error("chunk of type '{kind}' has malformed data: {reason}")]
    MalformedData { kind: ChunkKind, reason: String },
}

#[derive(Serialize, Deserialize)]
struct WireChunk {
    id: MessageId,
    seq: u64,
    #[serde(rename = "type")]
    kind: ChunkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct WireTool {
    name: String,
    #[serde(default)]
    output: Value,
}

impl From<ChatChunk> for WireChunk {
    fn from(chunk: ChatChunk) -> Self {
        let kind = chunk.kind();
        let data = match chunk.data {
            ChunkData::Text(text) | ChunkData::Error(text) => Some(Value::String(text)),
            ChunkData::Tool { name, output } => Some(serde_json::json!({
                "name": name,
                "output": output,
            })),
            ChunkData::Done => None,
        };
        WireChunk {
            id: chunk.id,
            seq: chunk.seq,
            kind,
            data,
        }
    }
}

impl TryFrom<WireChunk> for ChatChunk {
    type Error = ChunkError;

    fn try_from(wire: WireChunk) -> Result<Self, Self::Error> {
        let kind = wire.kind;
        let text = |data: Option<Value>| -> Result<String, ChunkError> {
            match data {
                Some(Value::String(s)) => Ok(s),
                Some(other) => Err(ChunkError::MalformedData {
                    kind,
                    reason: format!("expected a string, got {}", other),
                }),
                None => Err(ChunkError::MissingData(kind)),
            }
        };

        let data = match kind {
            ChunkKind::Text => ChunkData::Text(text(wire.data)?),
            ChunkKind::Error => ChunkData::Error(text(wire.data)?),
            ChunkKind::Done => ChunkData::Done,
            ChunkKind::Tool => {
                let value = wire.data.ok_or(ChunkError::MissingData(kind))?;
                let tool: WireTool =
                    serde_json::from_value(value).map_err(|e| ChunkError::MalformedData {
                        kind,
                        reason: e.to_string(),
                    })?;
                ChunkData::Tool {
                    name: tool.name,
                    output: tool.output,
                }
            }
        };

        Ok(ChatChunk {
            id: wire.id,
            seq: wire.seq,
            data,
        })
    }
}
