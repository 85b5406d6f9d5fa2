//! In-memory backend.
//!
//! Each collection sits behind its own [`tokio::sync::RwLock`]. A bulk
//! upsert takes the attendee write lock once, so readers observe either the
//! whole batch or none of it. A sync commit holds the attendee lock and then
//! the settings lock; nothing else takes both.

use std::collections::{BTreeMap, HashSet};

use tokio::sync::RwLock;

use super::SyncCommit;
use crate::domain::columns::{rebuild_available_columns, reconcile_defaults};
use crate::domain::{ApiCallLog, AttendeeId, AttendeeRecord, ConfigPatch, NewApiCallLog, UserConfig};
use crate::error::SyncError;

/// Process-local store for attendees, settings and API call logs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    attendees: RwLock<BTreeMap<AttendeeId, AttendeeRecord>>,
    settings: RwLock<UserConfig>,
    logs: RwLock<LogTable>,
}

#[derive(Debug, Default)]
struct LogTable {
    next_id: i64,
    /// Kept sorted by `(timestamp, id)`.
    entries: Vec<ApiCallLog>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every attendee ordered by id.
    pub async fn all_attendees(&self) -> Vec<AttendeeRecord> {
        self.attendees.read().await.values().cloned().collect()
    }

    /// Returns one attendee.
    pub async fn attendee(&self, id: AttendeeId) -> Option<AttendeeRecord> {
        self.attendees.read().await.get(&id).cloned()
    }

    /// Inserts or replaces every record of `batch` under one write lock.
    ///
    /// Returns the number of stored records afterwards.
    pub async fn upsert_attendees(&self, batch: Vec<AttendeeRecord>) -> usize {
        let mut map = self.attendees.write().await;
        for record in batch {
            map.insert(record.id, record);
        }
        map.len()
    }

    /// Upserts `batch` and merges the rebuilt column set plus reseeded
    /// defaults into settings, holding both write locks throughout.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MalformedRecord`] from the column rebuild, before
    /// anything is written.
    pub async fn commit_sync(
        &self,
        batch: Vec<AttendeeRecord>,
        max_depth: usize,
    ) -> Result<SyncCommit, SyncError> {
        let mut map = self.attendees.write().await;
        let mut settings = self.settings.write().await;

        let replaced: HashSet<AttendeeId> = batch.iter().map(|r| r.id).collect();
        let available_columns = rebuild_available_columns(
            map.values()
                .filter(|r| !replaced.contains(&r.id))
                .chain(batch.iter()),
            max_depth,
        )?;

        for record in batch {
            map.insert(record.id, record);
        }
        let old_settings = settings.clone();
        let patch = ConfigPatch {
            available_columns: Some(available_columns.clone()),
            ..reconcile_defaults(&settings)
        };
        settings.merge(patch);

        Ok(SyncCommit {
            total: map.len(),
            available_columns,
            old_settings,
            new_settings: settings.clone(),
        })
    }

    /// Removes every attendee.
    pub async fn clear_attendees(&self) {
        self.attendees.write().await.clear();
    }

    /// Number of stored attendees.
    pub async fn attendee_count(&self) -> usize {
        self.attendees.read().await.len()
    }

    /// Returns the settings blob.
    pub async fn settings(&self) -> UserConfig {
        self.settings.read().await.clone()
    }

    /// Applies `patch` and returns `(old, new)`.
    pub async fn merge_settings(&self, patch: ConfigPatch) -> (UserConfig, UserConfig) {
        let mut settings = self.settings.write().await;
        let old = settings.clone();
        settings.merge(patch);
        (old, settings.clone())
    }

    /// Removes the stored credential and returns `(old, new)`.
    pub async fn clear_api_token(&self) -> (UserConfig, UserConfig) {
        let mut settings = self.settings.write().await;
        let old = settings.clone();
        settings.api_token = None;
        (old, settings.clone())
    }

    /// Resets the settings blob and returns the previous value.
    pub async fn clear_settings(&self) -> UserConfig {
        std::mem::take(&mut *self.settings.write().await)
    }

    /// Appends a log entry, then evicts the oldest entries beyond `capacity`.
    ///
    /// Returns the id assigned to the new entry.
    pub async fn append_log(&self, log: NewApiCallLog, capacity: usize) -> i64 {
        let mut table = self.logs.write().await;
        table.next_id = table.next_id.saturating_add(1);
        let id = table.next_id;
        let stored = log.into_stored(id);

        let at = table
            .entries
            .partition_point(|e| (e.timestamp, e.id) <= (stored.timestamp, stored.id));
        table.entries.insert(at, stored);

        let excess = table.entries.len().saturating_sub(capacity);
        if excess > 0 {
            table.entries.drain(..excess);
        }
        id
    }

    /// Returns up to `limit` entries, newest first.
    pub async fn recent_logs(&self, limit: usize) -> Vec<ApiCallLog> {
        self.logs
            .read()
            .await
            .entries
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Returns every entry for `endpoint`, newest first.
    pub async fn logs_by_endpoint(&self, endpoint: &str) -> Vec<ApiCallLog> {
        self.logs
            .read()
            .await
            .entries
            .iter()
            .rev()
            .filter(|e| e.endpoint == endpoint)
            .cloned()
            .collect()
    }

    /// Number of stored log entries.
    pub async fn log_count(&self) -> usize {
        self.logs.read().await.entries.len()
    }

    /// Removes every log entry. Ids keep incrementing.
    pub async fn clear_logs(&self) {
        self.logs.write().await.entries.clear();
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::*;

    fn record(id: &str, name: &str) -> AttendeeRecord {
        let Ok(record) = AttendeeRecord::from_api(json!({"id": id, "name": name})) else {
            panic!("invalid fixture");
        };
        record
    }

    #[tokio::test]
    async fn upsert_replaces_whole_record() {
        let store = MemoryStore::new();
        store.upsert_attendees(vec![record("1", "Old"), record("2", "B")]).await;
        let Ok(replacement) = AttendeeRecord::from_api(json!({"id": "1", "email": "n@x"})) else {
            panic!("invalid fixture");
        };
        let total = store.upsert_attendees(vec![replacement.clone()]).await;
        assert_eq!(total, 2);

        let Some(stored) = store.attendee(AttendeeId::new(1)).await else {
            panic!("record missing");
        };
        assert_eq!(stored, replacement);
        assert!(!stored.raw.contains_key("name"));
    }

    #[tokio::test]
    async fn all_attendees_is_ordered_by_id() {
        let store = MemoryStore::new();
        store
            .upsert_attendees(vec![record("30", "c"), record("4", "a"), record("12", "b")])
            .await;
        let ids: Vec<i64> = store
            .all_attendees()
            .await
            .iter()
            .map(|r| r.id.get())
            .collect();
        assert_eq!(ids, vec![4, 12, 30]);
    }

    #[tokio::test]
    async fn clear_attendees_empties_store() {
        let store = MemoryStore::new();
        store.upsert_attendees(vec![record("1", "a")]).await;
        store.clear_attendees().await;
        assert_eq!(store.attendee_count().await, 0);
    }

    #[tokio::test]
    async fn merge_settings_returns_old_and_new() {
        let store = MemoryStore::new();
        let (old, new) = store
            .merge_settings(ConfigPatch::api_token("tok".to_string()))
            .await;
        assert!(old.api_token.is_none());
        assert_eq!(new.api_token.as_deref(), Some("tok"));

        let (_, cleared) = store.clear_api_token().await;
        assert!(cleared.api_token.is_none());
    }

    #[tokio::test]
    async fn commit_sync_reconciles_against_current_settings() {
        let store = MemoryStore::new();
        store
            .merge_settings(ConfigPatch {
                selected_columns: Some(vec!["name".to_string()]),
                searchable_columns: Some(Vec::new()),
                ..ConfigPatch::default()
            })
            .await;

        let Ok(commit) = store.commit_sync(vec![record("1", "A")], 32).await else {
            panic!("commit failed");
        };
        assert_eq!(commit.total, 1);
        assert_eq!(commit.available_columns, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(commit.old_settings.selected_columns, Some(vec!["name".to_string()]));

        let settings = store.settings().await;
        assert_eq!(settings, commit.new_settings);
        assert_eq!(settings.selected_columns, Some(vec!["name".to_string()]));
        assert_eq!(
            settings.searchable_columns.as_ref().map(Vec::len),
            Some(crate::domain::columns::DEFAULT_SEARCHABLE_COLUMNS.len())
        );
        assert_eq!(settings.available_columns, Some(commit.available_columns));
    }

    #[tokio::test]
    async fn commit_sync_rebuilds_from_stored_and_batch() {
        let store = MemoryStore::new();
        let Ok(first) = AttendeeRecord::from_api(json!({"id": 1, "old": "x"})) else {
            panic!("invalid fixture");
        };
        store.upsert_attendees(vec![first, record("2", "B")]).await;

        let Ok(replacement) = AttendeeRecord::from_api(json!({"id": 1, "email": "a@x"})) else {
            panic!("invalid fixture");
        };
        let Ok(commit) = store.commit_sync(vec![replacement], 32).await else {
            panic!("commit failed");
        };
        assert_eq!(commit.total, 2);
        assert_eq!(
            commit.available_columns,
            vec!["email".to_string(), "id".to_string(), "name".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_commit_writes_nothing() {
        let store = MemoryStore::new();
        let mut deep = json!("leaf");
        for _ in 0..5 {
            deep = json!({ "n": deep });
        }
        let Ok(stored) = AttendeeRecord::from_api(json!({"id": 1, "deep": deep})) else {
            panic!("invalid fixture");
        };
        store.upsert_attendees(vec![stored.clone()]).await;

        let result = store.commit_sync(vec![record("2", "B")], 3).await;
        assert!(matches!(result, Err(SyncError::MalformedRecord { .. })));
        assert_eq!(store.all_attendees().await, vec![stored]);
        assert_eq!(store.settings().await, UserConfig::default());
    }

    #[tokio::test]
    async fn log_ids_auto_increment() {
        let store = MemoryStore::new();
        let a = store.append_log(NewApiCallLog::started("GET", "/a"), 10).await;
        let b = store.append_log(NewApiCallLog::started("GET", "/b"), 10).await;
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn log_retention_keeps_most_recent() {
        let store = MemoryStore::new();
        let base = Utc::now();
        for i in 0..1005_i64 {
            let mut log = NewApiCallLog::started("GET", "/attendees");
            log.timestamp = base + Duration::milliseconds(i);
            store.append_log(log, 1000).await;
        }
        assert_eq!(store.log_count().await, 1000);

        let logs = store.recent_logs(2000).await;
        let Some(oldest) = logs.last() else {
            panic!("no logs");
        };
        assert_eq!(oldest.timestamp, base + Duration::milliseconds(5));
        let Some(newest) = logs.first() else {
            panic!("no logs");
        };
        assert_eq!(newest.timestamp, base + Duration::milliseconds(1004));
    }

    #[tokio::test]
    async fn eviction_is_by_timestamp_not_insertion() {
        let store = MemoryStore::new();
        let base = Utc::now();
        let mut late = NewApiCallLog::started("GET", "/late");
        late.timestamp = base + Duration::seconds(10);
        let mut early = NewApiCallLog::started("GET", "/early");
        early.timestamp = base;
        store.append_log(late, 1).await;
        store.append_log(early, 1).await;

        let logs = store.recent_logs(10).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs.first().map(|l| l.endpoint.as_str()), Some("/late"));
    }

    #[tokio::test]
    async fn logs_by_endpoint_filters_newest_first() {
        let store = MemoryStore::new();
        store.append_log(NewApiCallLog::started("GET", "/attendees"), 10).await;
        store.append_log(NewApiCallLog::started("GET", "/events"), 10).await;
        store.append_log(NewApiCallLog::started("GET", "/attendees"), 10).await;

        let logs = store.logs_by_endpoint("/attendees").await;
        let ids: Vec<i64> = logs.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
