//! Attendee entity as cached locally.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::AttendeeId;
use super::flatten::{FlatRecord, FlattenedEntry, flatten_with_limit, stringify_leaf};
use crate::error::SyncError;

/// One attendee, keyed by its Billetweb id.
///
/// `first_name`, `last_name`, `email` and `event_id` are denormalized copies
/// of fields also present in `raw`, which keeps the complete payload exactly
/// as the API delivered it. Records are only ever replaced whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendeeRecord {
    /// Billetweb attendee id.
    #[schema(value_type = i64)]
    pub id: AttendeeId,
    /// Copy of `raw.firstname`.
    pub first_name: String,
    /// Copy of `raw.name`.
    pub last_name: String,
    /// Copy of `raw.email`.
    pub email: String,
    /// Copy of `raw.event`.
    pub event_id: String,
    /// Full original payload.
    #[schema(value_type = Object)]
    pub raw: Map<String, Value>,
}

impl AttendeeRecord {
    /// Maps one element of the `/attendees` response into a record.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPayload`] if the element is not an object
    /// or its `id` is not an integer (number or decimal string).
    pub fn from_api(value: Value) -> Result<Self, SyncError> {
        let Value::Object(raw) = value else {
            return Err(SyncError::InvalidPayload(
                "attendee entry is not an object".to_string(),
            ));
        };
        let id = raw
            .get("id")
            .and_then(AttendeeId::from_json)
            .ok_or_else(|| {
                SyncError::InvalidPayload(format!(
                    "attendee id is missing or not an integer: {}",
                    raw.get("id").map_or_else(|| "null".to_string(), Value::to_string)
                ))
            })?;

        Ok(Self {
            id,
            first_name: text_field(&raw, "firstname"),
            last_name: text_field(&raw, "name"),
            email: text_field(&raw, "email"),
            event_id: text_field(&raw, "event"),
            raw,
        })
    }

    /// Flattens `raw` into leaf entries.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MalformedRecord`] beyond `max_depth`.
    pub fn flatten(&self, max_depth: usize) -> Result<Vec<FlattenedEntry>, SyncError> {
        flatten_with_limit(&self.raw, max_depth)
    }

    /// Flattens `raw` into a path lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MalformedRecord`] beyond `max_depth`.
    pub fn flat(&self, max_depth: usize) -> Result<FlatRecord, SyncError> {
        FlatRecord::from_record(&self.raw, max_depth)
    }
}

/// Reads a top-level field as text. Absent and falsy values (`null`,
/// `false`, `0`, `""`) give `""`.
fn text_field(raw: &Map<String, Value>, key: &str) -> String {
    match raw.get(key) {
        None | Some(Value::Null | Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(other) => stringify_leaf(other),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_denormalized_fields() {
        let payload = json!({
            "id": "1001",
            "firstname": "Ada",
            "name": "Lovelace",
            "email": "ada@example.com",
            "event": 77,
            "custom": {"phone": "0600"}
        });
        let Ok(record) = AttendeeRecord::from_api(payload.clone()) else {
            panic!("mapping failed");
        };
        assert_eq!(record.id, AttendeeId::new(1001));
        assert_eq!(record.first_name, "Ada");
        assert_eq!(record.last_name, "Lovelace");
        assert_eq!(record.email, "ada@example.com");
        assert_eq!(record.event_id, "77");
        assert_eq!(Value::Object(record.raw), payload);
    }

    #[test]
    fn missing_fields_become_empty() {
        let Ok(record) = AttendeeRecord::from_api(json!({"id": 5, "firstname": null})) else {
            panic!("mapping failed");
        };
        assert_eq!(record.first_name, "");
        assert_eq!(record.last_name, "");
        assert_eq!(record.email, "");
        assert_eq!(record.event_id, "");
    }

    #[test]
    fn falsy_fields_become_empty() {
        let payload = json!({"id": 6, "firstname": false, "name": 0, "email": "", "event": 0.0});
        let Ok(record) = AttendeeRecord::from_api(payload) else {
            panic!("mapping failed");
        };
        assert_eq!(record.first_name, "");
        assert_eq!(record.last_name, "");
        assert_eq!(record.email, "");
        assert_eq!(record.event_id, "");

        let Ok(record) = AttendeeRecord::from_api(json!({"id": 7, "firstname": true, "event": 3.0}))
        else {
            panic!("mapping failed");
        };
        assert_eq!(record.first_name, "true");
        assert_eq!(record.event_id, "3");
    }

    #[test]
    fn rejects_non_object_entries() {
        let result = AttendeeRecord::from_api(json!(["not", "an", "object"]));
        assert!(matches!(result, Err(SyncError::InvalidPayload(_))));
    }

    #[test]
    fn rejects_non_integer_ids() {
        assert!(AttendeeRecord::from_api(json!({"id": "abc"})).is_err());
        assert!(AttendeeRecord::from_api(json!({"firstname": "no id"})).is_err());
    }

    #[test]
    fn flat_reads_nested_paths() {
        let Ok(record) = AttendeeRecord::from_api(json!({"id": "1", "custom": {"phone": "0600"}}))
        else {
            panic!("mapping failed");
        };
        let Ok(flat) = record.flat(32) else {
            panic!("flatten failed");
        };
        assert_eq!(flat.get("custom.phone"), Some("0600"));
        assert_eq!(flat.get("id"), Some("1"));
    }
}
