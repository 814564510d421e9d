//! AI Provider Port - The text generator behind chat turns.
//!
//! The chat handler consumes an ordered stream of generation units: text
//! fragments and tool results. Prompting, model invocation and tool
//! execution stay behind this port.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

use crate::domain::foundation::SessionId;

/// Ordered units of one generated reply.
pub type GenerationStream = Pin<Box<dyn Stream<Item = Result<GenerationUnit, AIError>> + Send>>;

#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Starts generating a reply.
    ///
    /// `Err` means the turn never started. An `Err` item inside the stream
    /// means it failed part way and nothing follows it.
    async fn stream_complete(&self, request: GenerationRequest)
        -> Result<GenerationStream, AIError>;

    fn provider_info(&self) -> ProviderInfo;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationUnit {
    Text(String),
    Tool { name: String, output: Value },
}

/// Input for one reply.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Conversation so far, ending with the latest visitor message.
    pub messages: Vec<Message>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Set when the turn belongs to a tracked session.
    pub session_id: Option<SessionId>,
}

impl GenerationRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system_prompt(self, prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(prompt.into()),
            ..self
        }
    }

    pub fn with_max_tokens(self, max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..self
        }
    }

    pub fn with_temperature(self, temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..self
        }
    }

    pub fn with_session(self, session_id: SessionId) -> Self {
        Self {
            session_id: Some(session_id),
            ..self
        }
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rfind(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// One chat message as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Who is generating, for logs.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AIError {
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Whether the same request could succeed later. Logged with failures.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AIError::ContentFiltered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_generation_parameters() {
        let session_id = SessionId::parse("s-1").unwrap();
        let request = GenerationRequest::new(vec![
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("Tell me more"),
        ])
        .with_system_prompt("Be brief")
        .with_max_tokens(100)
        .with_temperature(0.5)
        .with_session(session_id.clone());

        assert_eq!(request.last_user_message(), Some("Tell me more"));
        assert_eq!(request.system_prompt.as_deref(), Some("Be brief"));
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.session_id, Some(session_id));
    }

    #[test]
    fn no_user_turn_means_no_last_user_message() {
        let request = GenerationRequest::new(vec![Message::assistant("Welcome")]);
        assert_eq!(request.last_user_message(), None);
    }

    #[test]
    fn message_wire_shape_uses_lowercase_roles() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        let parsed: Message = serde_json::from_str(r#"{"role":"system","content":"x"}"#).unwrap();
        assert_eq!(parsed.role, MessageRole::System);
    }

    #[test]
    fn only_filtered_content_is_final() {
        assert!(AIError::rate_limited(5).is_retryable());
        assert!(AIError::network("reset").is_retryable());
        assert!(!AIError::content_filtered("policy").is_retryable());
    }
}
