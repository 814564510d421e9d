//! Client-side view of streamed assistant messages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Notify;

use super::chunk::{ChatChunk, ChunkData};
use crate::domain::foundation::MessageId;

/// Lifecycle of one streamed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    Streaming,
    Done,
    Failed(String),
}

/// Tool output shown alongside a message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub name: String,
    pub output: Value,
}

/// One assistant message assembled from chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptMessage {
    pub id: MessageId,
    pub text: String,
    pub tools: Vec<ToolResult>,
    pub status: MessageStatus,
    next_seq: u64,
}

impl TranscriptMessage {
    fn new(id: MessageId) -> Self {
        Self {
            id,
            text: String::new(),
            tools: Vec::new(),
            status: MessageStatus::Streaming,
            next_seq: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != MessageStatus::Streaming
    }
}

/// Messages of a conversation, each grown in place by its chunks.
#[derive(Debug, Default)]
pub struct ChatTranscript {
    messages: Vec<TranscriptMessage>,
    index: HashMap<MessageId, usize>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a chunk to its message.
    ///
    /// Returns false, leaving the transcript untouched, for chunks that are
    /// out of sequence or arrive after the message finished.
    pub fn apply(&mut self, chunk: &ChatChunk) -> bool {
        let position = match self.index.get(&chunk.id) {
            Some(position) => *position,
            None if chunk.seq != 0 => return false,
            None => {
                self.messages.push(TranscriptMessage::new(chunk.id));
                let position = self.messages.len() - 1;
                self.index.insert(chunk.id, position);
                position
            }
        };
        let message = &mut self.messages[position];

        if message.is_finished() || chunk.seq != message.next_seq {
            return false;
        }
        message.next_seq += 1;

        match &chunk.data {
            ChunkData::Text(text) => message.text.push_str(text),
            ChunkData::Tool { name, output } => message.tools.push(ToolResult {
                name: name.clone(),
                output: output.clone(),
            }),
            ChunkData::Done => message.status = MessageStatus::Done,
            ChunkData::Error(reason) => message.status = MessageStatus::Failed(reason.clone()),
        }
        true
    }

    pub fn message(&self, id: &MessageId) -> Option<&TranscriptMessage> {
        self.index.get(id).map(|position| &self.messages[*position])
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&TranscriptMessage> {
        self.messages.last()
    }
}

/// Transcript shared between a reader task and its observers.
pub type SharedTranscript = Arc<tokio::sync::Mutex<ChatTranscript>>;

/// Cooperative cancellation for a streamed turn.
///
/// Clones share state. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Returns true when both tokens share state.
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn chunk(id: MessageId, seq: u64, data: ChunkData) -> ChatChunk {
        ChatChunk::new(id, seq, data)
    }

    mod transcript {
        use super::*;

        #[test]
        fn text_grows_one_message_in_place() {
            let id = MessageId::new();
            let mut transcript = ChatTranscript::new();
            for (seq, part) in ["Hel", "lo", " world"].iter().enumerate() {
                assert!(transcript.apply(&chunk(id, seq as u64, ChunkData::Text(part.to_string()))));
            }
            assert!(transcript.apply(&chunk(id, 3, ChunkData::Done)));

            assert_eq!(transcript.messages().len(), 1);
            let message = transcript.message(&id).unwrap();
            assert_eq!(message.text, "Hello world");
            assert_eq!(message.status, MessageStatus::Done);
        }

        #[test]
        fn chunks_after_terminal_are_ignored() {
            let id = MessageId::new();
            let mut transcript = ChatTranscript::new();
            transcript.apply(&chunk(id, 0, ChunkData::Error("boom".to_string())));
            assert!(!transcript.apply(&chunk(id, 1, ChunkData::Text("late".to_string()))));
            let message = transcript.message(&id).unwrap();
            assert_eq!(message.text, "");
            assert_eq!(message.status, MessageStatus::Failed("boom".to_string()));
        }

        #[test]
        fn out_of_sequence_chunks_are_rejected() {
            let id = MessageId::new();
            let mut transcript = ChatTranscript::new();
            assert!(!transcript.apply(&chunk(id, 1, ChunkData::Text("b".to_string()))));
            assert!(transcript.apply(&chunk(id, 0, ChunkData::Text("a".to_string()))));
            assert!(!transcript.apply(&chunk(id, 0, ChunkData::Text("a".to_string()))));
            assert_eq!(transcript.message(&id).unwrap().text, "a");
        }

        #[test]
        fn unknown_message_must_start_at_seq_zero() {
            let mut transcript = ChatTranscript::new();
            let id = MessageId::new();
            assert!(!transcript.apply(&chunk(id, 3, ChunkData::Text("late".to_string()))));
            assert!(transcript.messages().is_empty());
            assert!(transcript.message(&id).is_none());
        }

        #[test]
        fn tool_results_are_kept() {
            let id = MessageId::new();
            let mut transcript = ChatTranscript::new();
            transcript.apply(&chunk(
                id,
                0,
                ChunkData::Tool {
                    name: "roi".to_string(),
                    output: json!(42),
                },
            ));
            assert_eq!(transcript.last().unwrap().tools[0].name, "roi");
        }
    }

    mod cancel_token {
        use super::*;

        #[test]
        fn clones_share_state() {
            let token = CancelToken::new();
            let clone = token.clone();
            clone.cancel();
            clone.cancel();
            assert!(token.is_cancelled());
        }

        #[tokio::test]
        async fn cancelled_resolves_after_cancel() {
            let token = CancelToken::new();
            let waiter = {
                let token = token.clone();
                tokio::spawn(async move { token.cancelled().await })
            };
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter should finish")
                .unwrap();
        }

        #[tokio::test]
        async fn cancelled_resolves_immediately_when_already_cancelled() {
            let token = CancelToken::new();
            token.cancel();
            tokio::time::timeout(Duration::from_millis(100), token.cancelled())
                .await
                .unwrap();
        }
    }
}
