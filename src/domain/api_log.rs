//! Diagnostic log of calls made to the ticketing API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of log entries kept before the oldest are evicted.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// A log entry before it is stored (no id yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApiCallLog {
    /// When the call was started.
    pub timestamp: DateTime<Utc>,
    /// Endpoint path relative to the API base, e.g. `/attendees`.
    pub endpoint: String,
    /// HTTP method.
    pub method: String,
    /// Response status, when a response was received.
    pub status: Option<u16>,
    /// Parsed response body, when it was valid JSON.
    pub response_body: Option<serde_json::Value>,
    /// Transport error message, when no response was received.
    pub error: Option<String>,
    /// Wall-clock duration of the call.
    pub duration_ms: Option<u64>,
}

impl NewApiCallLog {
    /// Starts an entry for `method endpoint` at the current instant.
    #[must_use]
    pub fn started(method: &str, endpoint: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            status: None,
            response_body: None,
            error: None,
            duration_ms: None,
        }
    }

    /// Records the elapsed time since `timestamp`.
    #[must_use]
    pub fn finished(mut self) -> Self {
        let elapsed = Utc::now().signed_duration_since(self.timestamp);
        self.duration_ms = u64::try_from(elapsed.num_milliseconds()).ok();
        self
    }

    /// Attaches the received status and body.
    #[must_use]
    pub fn with_response(mut self, status: u16, body: Option<serde_json::Value>) -> Self {
        self.status = Some(status);
        self.response_body = body;
        self
    }

    /// Attaches a transport error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Assigns the store id.
    #[must_use]
    pub fn into_stored(self, id: i64) -> ApiCallLog {
        ApiCallLog {
            id,
            timestamp: self.timestamp,
            endpoint: self.endpoint,
            method: self.method,
            status: self.status,
            response_body: self.response_body,
            error: self.error,
            duration_ms: self.duration_ms,
        }
    }
}

/// A stored log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiCallLog {
    /// Auto-incremented id.
    pub id: i64,
    /// When the call was started.
    pub timestamp: DateTime<Utc>,
    /// Endpoint path relative to the API base.
    pub endpoint: String,
    /// HTTP method.
    pub method: String,
    /// Response status, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Parsed response body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub response_body: Option<serde_json::Value>,
    /// Transport error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Call duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_records_response() {
        let log = NewApiCallLog::started("GET", "/attendees")
            .with_response(200, Some(serde_json::json!([])))
            .finished();
        assert_eq!(log.status, Some(200));
        assert!(log.error.is_none());
        assert!(log.duration_ms.is_some());
    }

    #[test]
    fn into_stored_keeps_fields() {
        let log = NewApiCallLog::started("GET", "/attendees").with_error("connection refused");
        let stored = log.clone().into_stored(7);
        assert_eq!(stored.id, 7);
        assert_eq!(stored.timestamp, log.timestamp);
        assert_eq!(stored.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn serialization_omits_absent_fields() {
        let stored = NewApiCallLog::started("GET", "/attendees").into_stored(1);
        let json = serde_json::to_string(&stored).unwrap_or_default();
        assert!(!json.contains("status"));
        assert!(!json.contains("error"));
        assert!(json.contains("/attendees"));
    }
}
