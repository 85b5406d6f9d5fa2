//! Type-safe attendee identifier.
//!
//! [`AttendeeId`] is a newtype wrapper around the integer id assigned by the
//! ticketing system. It is never generated locally.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Primary key of an attendee record.
///
/// Supplied by Billetweb (where it travels as a decimal string) and used as
/// the upsert key of the attendee store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendeeId(i64);

impl AttendeeId {
    /// Wraps a raw integer id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the inner integer.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Reads an id from a JSON value, accepting integers and decimal strings.
    ///
    /// Returns `None` for anything else (floats, booleans, null, garbage).
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttendeeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

impl From<i64> for AttendeeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<AttendeeId> for i64 {
    fn from(id: AttendeeId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_accepts_string_and_number() {
        assert_eq!(AttendeeId::from_json(&json!("42")), Some(AttendeeId::new(42)));
        assert_eq!(AttendeeId::from_json(&json!(" 7 ")), Some(AttendeeId::new(7)));
        assert_eq!(AttendeeId::from_json(&json!(9)), Some(AttendeeId::new(9)));
    }

    #[test]
    fn from_json_rejects_non_integers() {
        assert_eq!(AttendeeId::from_json(&json!("abc")), None);
        assert_eq!(AttendeeId::from_json(&json!(1.5)), None);
        assert_eq!(AttendeeId::from_json(&json!(null)), None);
        assert_eq!(AttendeeId::from_json(&json!(true)), None);
    }

    #[test]
    fn serde_is_transparent() {
        let id = AttendeeId::new(123);
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "123");
        let Ok(back) = serde_json::from_str::<AttendeeId>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, id);
    }

    #[test]
    fn ordering_follows_integer_value() {
        let mut ids = vec![AttendeeId::new(10), AttendeeId::new(2), AttendeeId::new(7)];
        ids.sort();
        assert_eq!(ids, vec![AttendeeId::new(2), AttendeeId::new(7), AttendeeId::new(10)]);
    }
}
