//! Persistence layer: attendee collection, settings blob and API call log.
//!
//! [`Store`] is the single entry point. It dispatches to the in-memory or
//! the PostgreSQL backend and publishes a [`StoreEvent`] after every
//! settings mutation and attendee clear.

pub mod memory;
pub mod models;
pub mod postgres;

use chrono::Utc;

use crate::domain::{
    ApiCallLog, AttendeeId, AttendeeRecord, ConfigPatch, EventBus, NewApiCallLog, StoreEvent,
    UserConfig,
};
use crate::error::SyncError;

pub use memory::MemoryStore;
pub use postgres::PostgresPersistence;

/// Storage backend selected at startup.
#[derive(Debug)]
pub enum Backend {
    /// Process-local maps; contents are lost on restart.
    Memory(MemoryStore),
    /// PostgreSQL tables.
    Postgres(PostgresPersistence),
}

/// What a committed sync wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommit {
    /// Stored attendee count after the upsert.
    pub total: usize,
    /// Column set rebuilt from the post-upsert collection.
    pub available_columns: Vec<String>,
    /// Settings before the commit.
    pub old_settings: UserConfig,
    /// Settings after the commit.
    pub new_settings: UserConfig,
}

/// Facade over the selected [`Backend`] plus change notification.
#[derive(Debug)]
pub struct Store {
    backend: Backend,
    event_bus: EventBus,
    log_capacity: usize,
}

impl Store {
    /// Wraps `backend`, publishing change notifications on `event_bus` and
    /// keeping at most `log_capacity` API call logs.
    #[must_use]
    pub fn new(backend: Backend, event_bus: EventBus, log_capacity: usize) -> Self {
        Self {
            backend,
            event_bus,
            log_capacity,
        }
    }

    /// In-memory store, as used by tests and by default.
    #[must_use]
    pub fn in_memory(event_bus: EventBus, log_capacity: usize) -> Self {
        Self::new(Backend::Memory(MemoryStore::new()), event_bus, log_capacity)
    }

    /// Returns the change-notification bus.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns every attendee ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn all_attendees(&self) -> Result<Vec<AttendeeRecord>, SyncError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.all_attendees().await),
            Backend::Postgres(p) => p.all_attendees().await,
        }
    }

    /// Returns one attendee.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AttendeeNotFound`] if `id` is not stored.
    pub async fn attendee(&self, id: AttendeeId) -> Result<AttendeeRecord, SyncError> {
        let found = match &self.backend {
            Backend::Memory(m) => m.attendee(id).await,
            Backend::Postgres(p) => p.attendee(id).await?,
        };
        found.ok_or(SyncError::AttendeeNotFound(id))
    }

    /// Inserts or replaces the whole batch atomically; returns the stored
    /// record count afterwards.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure, in which case
    /// nothing was written.
    pub async fn upsert_attendees(&self, batch: Vec<AttendeeRecord>) -> Result<usize, SyncError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.upsert_attendees(batch).await),
            Backend::Postgres(p) => p.upsert_attendees(&batch).await,
        }
    }

    /// Writes a sync batch and its column settings as one unit.
    ///
    /// Upserts `batch`, rebuilds `availableColumns` from the resulting
    /// collection and reseeds empty default lists, all against the state
    /// held under the backend's locks (memory) or transaction (PostgreSQL).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MalformedRecord`] if a stored record nests deeper
    /// than `max_depth`, or a [`SyncError::Persistence`] on backend failure.
    /// Nothing is written in either case.
    pub async fn commit_sync(
        &self,
        batch: Vec<AttendeeRecord>,
        max_depth: usize,
    ) -> Result<SyncCommit, SyncError> {
        let commit = match &self.backend {
            Backend::Memory(m) => m.commit_sync(batch, max_depth).await?,
            Backend::Postgres(p) => p.commit_sync(&batch, max_depth).await?,
        };
        self.publish_settings_change(&commit.old_settings, &commit.new_settings);
        Ok(commit)
    }

    /// Deletes every attendee.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn clear_attendees(&self) -> Result<(), SyncError> {
        match &self.backend {
            Backend::Memory(m) => m.clear_attendees().await,
            Backend::Postgres(p) => {
                p.clear_attendees().await?;
            }
        }
        let _ = self.event_bus.publish(StoreEvent::AttendeesCleared {
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Number of stored attendees.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn attendee_count(&self) -> Result<usize, SyncError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.attendee_count().await),
            Backend::Postgres(p) => p.attendee_count().await,
        }
    }

    /// Returns the settings blob.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn settings(&self) -> Result<UserConfig, SyncError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.settings().await),
            Backend::Postgres(p) => p.settings().await,
        }
    }

    /// Merges `patch` into the settings blob and returns the new settings.
    /// An empty patch is a no-op and publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn update_settings(&self, patch: ConfigPatch) -> Result<UserConfig, SyncError> {
        if patch.is_empty() {
            return self.settings().await;
        }
        let (old, new) = match &self.backend {
            Backend::Memory(m) => m.merge_settings(patch).await,
            Backend::Postgres(p) => p.merge_settings(patch).await?,
        };
        self.publish_settings_change(&old, &new);
        Ok(new)
    }

    /// Removes the stored API credential.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn clear_api_token(&self) -> Result<UserConfig, SyncError> {
        let (old, new) = match &self.backend {
            Backend::Memory(m) => m.clear_api_token().await,
            Backend::Postgres(p) => p.clear_api_token().await?,
        };
        self.publish_settings_change(&old, &new);
        Ok(new)
    }

    /// Resets the settings blob, credential included.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn clear_settings(&self) -> Result<(), SyncError> {
        let old = match &self.backend {
            Backend::Memory(m) => m.clear_settings().await,
            Backend::Postgres(p) => p.clear_settings().await?,
        };
        self.publish_settings_change(&old, &UserConfig::default());
        Ok(())
    }

    fn publish_settings_change(&self, old: &UserConfig, new: &UserConfig) {
        if old == new {
            return;
        }
        let _ = self.event_bus.publish(StoreEvent::SettingsChanged {
            old: old.redacted(),
            new: new.redacted(),
            timestamp: Utc::now(),
        });
    }

    /// Appends an API call log, evicting the oldest entries beyond capacity.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn append_log(&self, log: NewApiCallLog) -> Result<i64, SyncError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.append_log(log, self.log_capacity).await),
            Backend::Postgres(p) => p.append_log(&log, self.log_capacity).await,
        }
    }

    /// Returns up to `limit` log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn recent_logs(&self, limit: usize) -> Result<Vec<ApiCallLog>, SyncError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.recent_logs(limit).await),
            Backend::Postgres(p) => p.recent_logs(limit).await,
        }
    }

    /// Returns every log entry for `endpoint`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn logs_by_endpoint(&self, endpoint: &str) -> Result<Vec<ApiCallLog>, SyncError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.logs_by_endpoint(endpoint).await),
            Backend::Postgres(p) => p.logs_by_endpoint(endpoint).await,
        }
    }

    /// Deletes every log entry.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on backend failure.
    pub async fn clear_logs(&self) -> Result<(), SyncError> {
        match &self.backend {
            Backend::Memory(m) => m.clear_logs().await,
            Backend::Postgres(p) => {
                p.clear_logs().await?;
            }
        }
        let _ = self.event_bus.publish(StoreEvent::LogsCleared {
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::in_memory(EventBus::new(16), 1000)
    }

    #[tokio::test]
    async fn settings_change_is_notified_redacted() {
        let store = store();
        let mut rx = store.event_bus().subscribe();

        let result = store
            .update_settings(ConfigPatch::api_token("secret".to_string()))
            .await;
        assert!(result.is_ok());

        let Ok(StoreEvent::SettingsChanged { old, new, .. }) = rx.recv().await else {
            panic!("expected settings event");
        };
        assert!(old.api_token.is_none());
        assert_eq!(new.api_token.as_deref(), Some("********"));
    }

    #[tokio::test]
    async fn empty_patch_publishes_nothing() {
        let store = store();
        let mut rx = store.event_bus().subscribe();
        let _ = store.update_settings(ConfigPatch::default()).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_attendee_is_not_found() {
        let store = store();
        let result = store.attendee(AttendeeId::new(99)).await;
        assert!(matches!(result, Err(SyncError::AttendeeNotFound(_))));
    }

    #[tokio::test]
    async fn clear_settings_resets_everything() {
        let store = store();
        let _ = store
            .update_settings(ConfigPatch::selected(vec!["email".to_string()]))
            .await;
        let _ = store.clear_settings().await;
        let Ok(settings) = store.settings().await else {
            panic!("settings unavailable");
        };
        assert_eq!(settings, UserConfig::default());
    }

    #[tokio::test]
    async fn commit_sync_publishes_settings_change() {
        let store = store();
        let mut rx = store.event_bus().subscribe();
        let Ok(record) = AttendeeRecord::from_api(serde_json::json!({"id": 1, "email": "a@x"}))
        else {
            panic!("invalid fixture");
        };
        let Ok(commit) = store.commit_sync(vec![record], 32).await else {
            panic!("commit failed");
        };
        assert_eq!(commit.total, 1);

        let Ok(StoreEvent::SettingsChanged { new, .. }) = rx.recv().await else {
            panic!("expected settings event");
        };
        assert_eq!(new.available_columns, Some(commit.available_columns));
    }

    #[tokio::test]
    async fn clear_attendees_publishes_event() {
        let store = store();
        let mut rx = store.event_bus().subscribe();
        let _ = store.clear_attendees().await;
        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "attendees_cleared");
    }
}
