//! UTC timestamps for persisted records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_is_monotonic_enough_for_touch() {
        let first = Timestamp::now();
        let second = Timestamp::now();
        assert!(second >= first);
    }

    #[test]
    fn serializes_as_rfc3339_string() {
        let ts = Timestamp::from(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-01-15T10:30:00Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
