//! Database row models for attendees and API call logs.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;

use crate::domain::{ApiCallLog, AttendeeId, AttendeeRecord};

/// A row of the `attendees` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendeeRow {
    /// Billetweb attendee id.
    pub id: i64,
    /// Denormalized first name.
    pub first_name: String,
    /// Denormalized last name.
    pub last_name: String,
    /// Denormalized email.
    pub email: String,
    /// Denormalized event id.
    pub event_id: String,
    /// Original payload (JSON, key order preserved).
    pub raw: Json<Map<String, Value>>,
}

impl From<AttendeeRow> for AttendeeRecord {
    fn from(row: AttendeeRow) -> Self {
        Self {
            id: AttendeeId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            event_id: row.event_id,
            raw: row.raw.0,
        }
    }
}

/// A row of the `api_call_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiCallLogRow {
    /// Auto-increment row id.
    pub id: i64,
    /// Call start.
    pub timestamp: DateTime<Utc>,
    /// Endpoint path.
    pub endpoint: String,
    /// HTTP method.
    pub method: String,
    /// Response status.
    pub status: Option<i32>,
    /// Parsed response body.
    pub response_body: Option<Value>,
    /// Transport error.
    pub error: Option<String>,
    /// Call duration.
    pub duration_ms: Option<i64>,
}

impl From<ApiCallLogRow> for ApiCallLog {
    fn from(row: ApiCallLogRow) -> Self {
        Self {
            id: row.id,
            timestamp: row.timestamp,
            endpoint: row.endpoint,
            method: row.method,
            status: row.status.and_then(|s| u16::try_from(s).ok()),
            response_body: row.response_body,
            error: row.error,
            duration_ms: row.duration_ms.and_then(|d| u64::try_from(d).ok()),
        }
    }
}
