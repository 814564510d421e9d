//! Request header helpers.

use axum::http::HeaderMap;

use crate::domain::foundation::{SessionId, ValidationError};

pub const SESSION_ID_HEADER: &str = "x-session-id";
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Returns a header as text, ignoring missing or non-UTF-8 values.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Parses `x-session-id`, treating a blank header as absent.
pub fn session_id_header(headers: &HeaderMap) -> Result<Option<SessionId>, ValidationError> {
    header_str(headers, SESSION_ID_HEADER)
        .filter(|value| !value.trim().is_empty())
        .map(SessionId::parse)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn blank_session_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(session_id_header(&headers).unwrap(), None);
    }

    #[test]
    fn session_header_is_validated() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("bad id!"));
        assert!(session_id_header(&headers).is_err());

        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(
            session_id_header(&headers).unwrap().unwrap().as_str(),
            "abc-123"
        );
    }
}
