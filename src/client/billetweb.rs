//! Billetweb REST API client.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};

use crate::error::SyncError;

/// Path of the attendee listing, relative to the API base URL.
pub const ATTENDEES_ENDPOINT: &str = "/attendees";

/// Status, reason phrase and best-effort JSON body of one API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase (`"Unauthorized"`), empty when unknown.
    pub reason: String,
    /// Response body, when it parsed as JSON.
    pub body: Option<serde_json::Value>,
}

impl ApiResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// HTTP client for one Billetweb API base URL.
#[derive(Debug, Clone)]
pub struct BilletwebClient {
    http: reqwest::Client,
    base_url: String,
}

impl BilletwebClient {
    /// Builds a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Internal`] if the TLS backend cannot be
    /// initialized.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /attendees` for the account behind `credential`.
    ///
    /// # Errors
    ///
    /// Returns the transport error if no response was received. Non-2xx
    /// responses are returned as `Ok` for the caller to judge.
    pub async fn fetch_attendees(&self, credential: &str) -> Result<ApiResponse, reqwest::Error> {
        self.get(ATTENDEES_ENDPOINT, credential).await
    }

    async fn get(&self, endpoint: &str, credential: &str) -> Result<ApiResponse, reqwest::Error> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut request = self
            .http
            .get(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // A credential with bytes invalid in a header goes out without one
        // and is answered by a 401.
        if let Ok(value) = HeaderValue::from_str(&normalize_credential(credential)) {
            request = request.header(AUTHORIZATION, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).ok();

        tracing::debug!(endpoint, status = status.as_u16(), "billetweb response");
        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Builds the `Authorization` value from a user-supplied credential.
///
/// The credential is trimmed; a leading `basic ` prefix in any case is
/// rewritten to `Basic `, and a bare token gets the prefix added.
#[must_use]
pub fn normalize_credential(credential: &str) -> String {
    let trimmed = credential.trim();
    let token = match (trimmed.get(..5), trimmed.get(5..)) {
        (Some(prefix), Some(rest))
            if prefix.eq_ignore_ascii_case("basic") && rest.starts_with(char::is_whitespace) =>
        {
            rest.trim_start()
        }
        _ => trimmed,
    };
    format!("Basic {token}")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn bare_token_gets_prefix() {
        assert_eq!(normalize_credential("abc123"), "Basic abc123");
        assert_eq!(normalize_credential("  abc123 \n"), "Basic abc123");
    }

    #[test]
    fn existing_prefix_is_normalized() {
        assert_eq!(normalize_credential("Basic abc123"), "Basic abc123");
        assert_eq!(normalize_credential("basic   abc123"), "Basic abc123");
        assert_eq!(normalize_credential("BASIC\tabc123"), "Basic abc123");
    }

    #[test]
    fn prefix_requires_separator() {
        assert_eq!(normalize_credential("basicabc"), "Basic basicabc");
        assert_eq!(normalize_credential("Basic"), "Basic Basic");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let Ok(client) = BilletwebClient::new("http://localhost:1/api/", Duration::from_secs(1))
        else {
            panic!("client build failed");
        };
        assert_eq!(client.base_url(), "http://localhost:1/api");
    }

    #[test]
    fn success_range() {
        let ok = ApiResponse {
            status: 204,
            reason: String::new(),
            body: None,
        };
        assert!(ok.is_success());
        let denied = ApiResponse {
            status: 403,
            ..ok
        };
        assert!(!denied.is_success());
    }
}
