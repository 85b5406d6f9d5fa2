//! Query and request types shared by the attendee, sync and log endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::api_log::DEFAULT_LOG_CAPACITY;

/// Default number of log entries returned by `GET /logs`.
pub const DEFAULT_LOG_LIMIT: usize = 100;

/// Query parameters of `GET /attendees`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Substring to look for in the searchable columns. Blank lists all.
    #[serde(default)]
    pub q: String,
}

/// Optional body of `POST /sync`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SyncRequest {
    /// Credential for this sync only. The stored credential is used when absent.
    #[serde(default)]
    pub token: Option<String>,
}

/// Query parameters of `GET /logs`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogParams {
    /// Maximum entries returned, newest first. Defaults to 100.
    #[serde(default = "default_log_limit")]
    pub limit: usize,
    /// Only entries for this endpoint (e.g. `/attendees`).
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_log_limit() -> usize {
    DEFAULT_LOG_LIMIT
}

impl LogParams {
    /// Clamps `limit` to `1..=1000`.
    #[must_use]
    pub fn clamped_limit(&self) -> usize {
        self.limit.clamp(1, DEFAULT_LOG_CAPACITY)
    }
}

/// Response of `DELETE` endpoints that report nothing else.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClearedResponse {
    /// What was cleared (`attendees`, `logs`, `settings`, `token`).
    pub cleared: String,
}

impl ClearedResponse {
    /// Builds the response for `what`.
    #[must_use]
    pub fn new(what: &str) -> Self {
        Self {
            cleared: what.to_string(),
        }
    }
}
