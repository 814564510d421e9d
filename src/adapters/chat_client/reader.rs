//! Reads one streamed turn into a transcript.

use std::fmt::Display;

use futures::{Stream, StreamExt};

use super::ChatClientError;
use crate::domain::chat::{CancelToken, ChunkData, FrameDecoder, SharedTranscript};
use crate::domain::foundation::MessageId;

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The server sent `done`.
    Completed(MessageId),
    /// The server sent `error`.
    Failed { id: MessageId, reason: String },
    /// The token was cancelled before a terminal chunk was applied.
    Cancelled,
}

/// Consumes `body` sequentially, applying each decoded chunk to `transcript`
/// until a terminal chunk.
///
/// A chunk is applied only if `token` is not cancelled at the moment of
/// application; the check happens while holding the transcript lock.
pub async fn read_turn<S, B, E>(
    body: S,
    token: &CancelToken,
    transcript: &SharedTranscript,
) -> Result<TurnOutcome, ChatClientError>
where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = Box::pin(body);
    let mut decoder = FrameDecoder::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(TurnOutcome::Cancelled),
            next = body.next() => next,
        };
        let Some(bytes) = next else {
            decoder.finish()?;
            return Err(ChatClientError::Incomplete);
        };
        let bytes = bytes.map_err(|e| ChatClientError::Transport(e.to_string()))?;

        for frame in decoder.push(bytes.as_ref())? {
            let chunk = frame.to_chunk()?;
            let mut transcript = transcript.lock().await;
            if token.is_cancelled() {
                return Ok(TurnOutcome::Cancelled);
            }
            if !transcript.apply(&chunk) {
                tracing::warn!(
                    message_id = %chunk.id,
                    seq = chunk.seq,
                    "Dropping out-of-sequence chunk"
                );
                continue;
            }
            match chunk.data {
                ChunkData::Done => return Ok(TurnOutcome::Completed(chunk.id)),
                ChunkData::Error(reason) => {
                    return Ok(TurnOutcome::Failed {
                        id: chunk.id,
                        reason,
                    })
                }
                ChunkData::Text(_) | ChunkData::Tool { .. } => {}
            }
        }
    }
}
