//! HTTP client for the streaming chat endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use super::reader::{read_turn, TurnOutcome};
use super::ChatClientError;
use crate::domain::chat::{CancelToken, SharedTranscript};
use crate::domain::foundation::SessionId;
use crate::ports::Message;

const CHAT_PATH: &str = "/api/chat";
const SESSION_HEADER: &str = "x-session-id";

#[derive(Serialize)]
struct ChatBody<'a> {
    version: u32,
    messages: &'a [Message],
}

/// Streams assistant turns into shared transcripts.
///
/// At most one turn per conversation key is live: starting a turn cancels
/// the previous one for the same key.
#[derive(Clone)]
pub struct ChatStreamClient {
    client: Client,
    base_url: String,
    active: Arc<Mutex<HashMap<String, CancelToken>>>,
}

impl ChatStreamClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChatClientError::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            active: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Registers a new turn for `conversation`, cancelling any live one.
    pub fn begin_turn(&self, conversation: &str) -> CancelToken {
        let token = CancelToken::new();
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conversation.to_string(), token.clone());
        if let Some(previous) = previous {
            tracing::debug!(conversation = %conversation, "Cancelling previous turn");
            previous.cancel();
        }
        token
    }

    /// Cancels the live turn of `conversation`, if any.
    pub fn cancel(&self, conversation: &str) {
        let token = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(conversation);
        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Number of live turns.
    pub fn active_turns(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sends `messages` and streams the reply into `transcript`.
    pub async fn send(
        &self,
        conversation: &str,
        session_id: Option<&SessionId>,
        messages: &[Message],
        transcript: &SharedTranscript,
    ) -> Result<TurnOutcome, ChatClientError> {
        let token = self.begin_turn(conversation);
        let outcome = self.stream_turn(&token, session_id, messages, transcript).await;
        self.end_turn(conversation, &token);
        outcome
    }

    async fn stream_turn(
        &self,
        token: &CancelToken,
        session_id: Option<&SessionId>,
        messages: &[Message],
        transcript: &SharedTranscript,
    ) -> Result<TurnOutcome, ChatClientError> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, CHAT_PATH))
            .json(&ChatBody {
                version: 1,
                messages,
            });
        if let Some(session_id) = session_id {
            request = request.header(SESSION_HEADER, session_id.as_str());
        }

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(TurnOutcome::Cancelled),
            response = request.send() => response.map_err(|e| ChatClientError::Request(e.to_string()))?,
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        read_turn(response.bytes_stream(), token, transcript).await
    }

    fn end_turn(&self, conversation: &str, token: &CancelToken) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active
            .get(conversation)
            .is_some_and(|current| current.same_as(token))
        {
            active.remove(conversation);
        }
    }
}
