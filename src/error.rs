//! Error types with HTTP status code mapping.
//!
//! [`SyncError`] is the central error type of the crate. Each variant maps
//! to a numeric error code, an HTTP status code and a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::AttendeeId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "billetweb returned HTTP 401: Unauthorized",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Crate-wide error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status               |
/// |-----------|-------------------|---------------------------|
/// | 1000–1999 | Validation        | 400 / 404 / 409           |
/// | 2000–2999 | Ticketing API     | 502 Bad Gateway           |
/// | 3000–3999 | Server            | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No credential was supplied or stored before a sync.
    #[error("missing API credential")]
    MissingCredential,

    /// The ticketing API answered with a non-success status.
    #[error("billetweb returned HTTP {status}: {message}")]
    HttpStatus {
        /// Response status code.
        status: u16,
        /// Reason phrase or error text.
        message: String,
    },

    /// The ticketing API could not be reached or the transfer failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A record nests mappings deeper than the configured bound.
    #[error("malformed record: nesting exceeds {depth} levels")]
    MalformedRecord {
        /// The depth bound that was exceeded.
        depth: usize,
    },

    /// The ticketing API returned a body that is not a list of attendees.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Another sync is already running.
    #[error("a sync is already in progress")]
    SyncInProgress,

    /// No attendee with the given id is stored.
    #[error("attendee not found: {0}")]
    AttendeeNotFound(AttendeeId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::MissingCredential => 1002,
            Self::AttendeeNotFound(_) => 1004,
            Self::SyncInProgress => 1009,
            Self::HttpStatus { .. } => 2001,
            Self::Transport(_) => 2002,
            Self::InvalidPayload(_) => 2003,
            Self::MalformedRecord { .. } => 2004,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::MissingCredential => StatusCode::BAD_REQUEST,
            Self::AttendeeNotFound(_) => StatusCode::NOT_FOUND,
            Self::SyncInProgress => StatusCode::CONFLICT,
            Self::HttpStatus { .. }
            | Self::Transport(_)
            | Self::InvalidPayload(_)
            | Self::MalformedRecord { .. } => StatusCode::BAD_GATEWAY,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::HttpStatus { status, .. } => Some(format!("upstream status {status}")),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
