//! Sync service: pulls attendees from Billetweb into the local store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::client::billetweb::ATTENDEES_ENDPOINT;
use crate::client::{ApiResponse, BilletwebClient};
use crate::domain::{AttendeeRecord, NewApiCallLog, StoreEvent};
use crate::error::SyncError;
use crate::persistence::Store;

/// Result of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncOutcome {
    /// Records received from the API in this sync.
    pub synced: usize,
    /// Records in the store after the upsert.
    pub total: usize,
    /// Rebuilt, sorted column set.
    pub available_columns: Vec<String>,
}

/// Orchestrates one sync at a time.
///
/// Fetching and payload validation run before anything is written. The
/// records and the column settings are then committed together, so a failed
/// sync leaves attendees and settings untouched. The call log is written in
/// every case and its failures are only logged.
#[derive(Debug)]
pub struct SyncService {
    client: BilletwebClient,
    store: Arc<Store>,
    max_depth: usize,
    in_flight: Mutex<()>,
    syncing: AtomicBool,
}

impl SyncService {
    /// Creates a new `SyncService`.
    #[must_use]
    pub fn new(client: BilletwebClient, store: Arc<Store>, max_depth: usize) -> Self {
        Self {
            client,
            store,
            max_depth,
            in_flight: Mutex::new(()),
            syncing: AtomicBool::new(false),
        }
    }

    /// Returns a reference to the inner [`Store`].
    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Returns `true` while a sync is running.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Syncs using the credential stored in settings.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingCredential`] if no credential is stored,
    /// otherwise anything [`SyncService::sync`] returns.
    pub async fn sync_with_stored_credential(&self) -> Result<SyncOutcome, SyncError> {
        let token = self.store.settings().await?.api_token.unwrap_or_default();
        self.sync(&token).await
    }

    /// Fetches every attendee, upserts them, rebuilds the column registry
    /// and reseeds default column choices where empty.
    ///
    /// # Errors
    ///
    /// - [`SyncError::MissingCredential`] for a blank credential (no request made);
    /// - [`SyncError::SyncInProgress`] if another sync is running;
    /// - [`SyncError::Transport`] / [`SyncError::HttpStatus`] on API failure;
    /// - [`SyncError::InvalidPayload`] / [`SyncError::MalformedRecord`] on a bad body;
    /// - [`SyncError::Persistence`] if the store rejects the batch.
    pub async fn sync(&self, credential: &str) -> Result<SyncOutcome, SyncError> {
        if credential.trim().is_empty() {
            return Err(SyncError::MissingCredential);
        }
        let Ok(_guard) = self.in_flight.try_lock() else {
            return Err(SyncError::SyncInProgress);
        };
        let _flag = SyncingFlag::raise(&self.syncing);

        tracing::info!(base_url = self.client.base_url(), "sync started");
        let result = self.run(credential).await;
        match &result {
            Ok(outcome) => tracing::info!(
                synced = outcome.synced,
                total = outcome.total,
                columns = outcome.available_columns.len(),
                "sync completed"
            ),
            Err(e) => tracing::warn!(error = %e, code = e.error_code(), "sync failed"),
        }
        result
    }

    async fn run(&self, credential: &str) -> Result<SyncOutcome, SyncError> {
        let response = self.fetch(credential).await?;
        let batch = parse_attendees(response.body, self.max_depth)?;
        let synced = batch.len();

        let commit = self.store.commit_sync(batch, self.max_depth).await?;
        let total = commit.total;
        let available_columns = commit.available_columns;

        let _ = self.store.event_bus().publish(StoreEvent::AttendeesSynced {
            synced,
            total,
            column_count: available_columns.len(),
            timestamp: Utc::now(),
        });

        Ok(SyncOutcome {
            synced,
            total,
            available_columns,
        })
    }

    /// Calls the API, logging the attempt, and rejects non-2xx responses.
    async fn fetch(&self, credential: &str) -> Result<ApiResponse, SyncError> {
        let log = NewApiCallLog::started("GET", ATTENDEES_ENDPOINT);
        match self.client.fetch_attendees(credential).await {
            Ok(response) => {
                self.record_call(
                    log.with_response(response.status, response.body.clone())
                        .finished(),
                )
                .await;
                if response.is_success() {
                    Ok(response)
                } else {
                    Err(SyncError::HttpStatus {
                        status: response.status,
                        message: response.reason,
                    })
                }
            }
            Err(e) => {
                self.record_call(log.with_error(e.to_string()).finished())
                    .await;
                Err(SyncError::from(e))
            }
        }
    }

    async fn record_call(&self, log: NewApiCallLog) {
        if let Err(e) = self.store.append_log(log).await {
            tracing::warn!(error = %e, "failed to record api call");
        }
    }
}

/// Keeps [`SyncService::is_syncing`] raised while a sync holds the guard,
/// including when the sync future is dropped mid-way.
struct SyncingFlag<'a>(&'a AtomicBool);

impl<'a> SyncingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for SyncingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Maps the `/attendees` body into records, checking that each one can be
/// flattened within `max_depth`.
fn parse_attendees(body: Option<Value>, max_depth: usize) -> Result<Vec<AttendeeRecord>, SyncError> {
    let Some(body) = body else {
        return Err(SyncError::InvalidPayload(
            "response body is not JSON".to_string(),
        ));
    };
    let Value::Array(items) = body else {
        return Err(SyncError::InvalidPayload(
            "expected a JSON array of attendees".to_string(),
        ));
    };
    items
        .into_iter()
        .map(|item| {
            let record = AttendeeRecord::from_api(item)?;
            record.flatten(max_depth)?;
            Ok(record)
        })
        .collect()
}
