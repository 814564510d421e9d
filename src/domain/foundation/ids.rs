//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Maximum accepted length of a caller-supplied session id.
pub const MAX_SESSION_ID_LENGTH: usize = 128;

/// Identifier for a conversational session.
///
/// Callers may bring their own id (request body or correlation header), so
/// this wraps a validated string rather than a UUID. Generated ids are UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random SessionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validates and wraps a caller-supplied id.
    ///
    /// Accepts ASCII alphanumerics plus `-`, `_`, `.` and `:`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("session_id"));
        }
        if trimmed.len() > MAX_SESSION_ID_LENGTH {
            return Err(ValidationError::invalid_format(
                "session_id",
                format!("must be at most {} characters", MAX_SESSION_ID_LENGTH),
            ));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        {
            return Err(ValidationError::invalid_format(
                "session_id",
                "contains unsupported characters",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Unique identifier for a streamed assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random MessageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a MessageId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod session_id {
        use super::*;

        #[test]
        fn generates_unique_ids() {
            assert_ne!(SessionId::new(), SessionId::new());
        }

        #[test]
        fn generated_id_is_a_uuid() {
            let id = SessionId::new();
            assert!(Uuid::parse_str(id.as_str()).is_ok());
        }

        #[test]
        fn parse_trims_whitespace() {
            let id = SessionId::parse("  abc-123 ").unwrap();
            assert_eq!(id.as_str(), "abc-123");
        }

        #[test]
        fn parse_rejects_empty() {
            assert!(SessionId::parse("   ").is_err());
        }

        #[test]
        fn parse_rejects_unsupported_characters() {
            assert!(SessionId::parse("abc/def").is_err());
            assert!(SessionId::parse("abc def").is_err());
        }

        #[test]
        fn parse_rejects_overlong_ids() {
            let raw = "a".repeat(MAX_SESSION_ID_LENGTH + 1);
            assert!(SessionId::parse(raw).is_err());
        }

        #[test]
        fn serializes_as_plain_string() {
            let id = SessionId::parse("session-1").unwrap();
            assert_eq!(serde_json::to_string(&id).unwrap(), "\"session-1\"");
        }

        #[test]
        fn deserialization_validates() {
            let ok: Result<SessionId, _> = serde_json::from_str("\"s-1\"");
            assert!(ok.is_ok());
            let bad: Result<SessionId, _> = serde_json::from_str("\"\"");
            assert!(bad.is_err());
        }
    }

    mod message_id {
        use super::*;

        #[test]
        fn displays_as_uuid() {
            let id = MessageId::new();
            assert_eq!(id.to_string().len(), 36);
        }

        #[test]
        fn parses_from_display() {
            let id = MessageId::new();
            let parsed: MessageId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }
    }
}
