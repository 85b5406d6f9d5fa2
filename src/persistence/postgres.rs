//! PostgreSQL implementation of the persistence layer.
//!
//! Bulk upserts and settings merges each run in a single transaction, so a
//! concurrent reader sees either the previous committed state or the new one.
//! A sync commit writes attendees and settings in one transaction.
//! Attendee payloads go to a `JSON` column (bound as text) so that the key
//! order the API delivered is kept for flattening.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use sqlx::types::Json;

use super::SyncCommit;
use super::models::{ApiCallLogRow, AttendeeRow};
use crate::config::SyncConfig;
use crate::domain::columns::{rebuild_available_columns, reconcile_defaults};
use crate::domain::{
    ApiCallLog, AttendeeId, AttendeeRecord, ConfigPatch, NewApiCallLog, UserConfig,
};
use crate::error::SyncError;

const ATTENDEE_COLUMNS: &str = "id, first_name, last_name, email, event_id, raw";
const LOG_COLUMNS: &str =
    "id, \"timestamp\", endpoint, method, status, response_body, error, duration_ms";

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the pool settings of `config` and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] if the database is unreachable
    /// or a migration fails.
    pub async fn connect(config: &SyncConfig) -> Result<Self, SyncError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| SyncError::Persistence(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Loads every attendee ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn all_attendees(&self) -> Result<Vec<AttendeeRecord>, SyncError> {
        let rows = sqlx::query_as::<_, AttendeeRow>(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AttendeeRecord::from).collect())
    }

    /// Loads one attendee.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn attendee(&self, id: AttendeeId) -> Result<Option<AttendeeRecord>, SyncError> {
        let row = sqlx::query_as::<_, AttendeeRow>(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AttendeeRecord::from))
    }

    /// Inserts or replaces every record of `batch` in one transaction.
    ///
    /// Returns the number of stored records after commit.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure; the whole
    /// batch is rolled back.
    pub async fn upsert_attendees(&self, batch: &[AttendeeRecord]) -> Result<usize, SyncError> {
        let mut tx = self.pool.begin().await?;
        for record in batch {
            upsert_attendee(&mut tx, record).await?;
        }
        let total = count_attendees(&mut tx).await?;
        tx.commit().await?;
        Ok(total)
    }

    /// Upserts `batch`, rebuilds the column set from the stored rows and
    /// merges it with reseeded defaults under the settings row lock, all in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MalformedRecord`] from the column rebuild or a
    /// [`SyncError::Persistence`] on database failure; either rolls back.
    pub async fn commit_sync(
        &self,
        batch: &[AttendeeRecord],
        max_depth: usize,
    ) -> Result<SyncCommit, SyncError> {
        let mut tx = self.pool.begin().await?;
        for record in batch {
            upsert_attendee(&mut tx, record).await?;
        }
        let rows = sqlx::query_as::<_, AttendeeRow>(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees ORDER BY id ASC"
        ))
        .fetch_all(&mut *tx)
        .await?;
        let records: Vec<AttendeeRecord> = rows.into_iter().map(AttendeeRecord::from).collect();
        let available_columns = rebuild_available_columns(&records, max_depth)?;

        let old_settings = lock_settings(&mut tx).await?;
        let mut new_settings = old_settings.clone();
        new_settings.merge(ConfigPatch {
            available_columns: Some(available_columns.clone()),
            ..reconcile_defaults(&old_settings)
        });
        store_settings(&mut tx, &new_settings).await?;
        tx.commit().await?;

        Ok(SyncCommit {
            total: records.len(),
            available_columns,
            old_settings,
            new_settings,
        })
    }

    /// Deletes every attendee.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn clear_attendees(&self) -> Result<u64, SyncError> {
        let result = sqlx::query("DELETE FROM attendees")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Counts stored attendees.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn attendee_count(&self) -> Result<usize, SyncError> {
        let mut conn = self.pool.acquire().await?;
        count_attendees(&mut conn).await
    }

    /// Loads the settings blob.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn settings(&self) -> Result<UserConfig, SyncError> {
        let value: Option<Json<UserConfig>> =
            sqlx::query_scalar("SELECT value FROM user_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.map(|v| v.0).unwrap_or_default())
    }

    /// Applies `patch` under a row lock and returns `(old, new)`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn merge_settings(
        &self,
        patch: ConfigPatch,
    ) -> Result<(UserConfig, UserConfig), SyncError> {
        self.modify_settings(|config| config.merge(patch)).await
    }

    /// Removes the stored credential and returns `(old, new)`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn clear_api_token(&self) -> Result<(UserConfig, UserConfig), SyncError> {
        self.modify_settings(|config| config.api_token = None).await
    }

    /// Resets the settings blob and returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn clear_settings(&self) -> Result<UserConfig, SyncError> {
        let (old, _) = self
            .modify_settings(|config| *config = UserConfig::default())
            .await?;
        Ok(old)
    }

    async fn modify_settings<F>(&self, apply: F) -> Result<(UserConfig, UserConfig), SyncError>
    where
        F: FnOnce(&mut UserConfig),
    {
        let mut tx = self.pool.begin().await?;
        let old = lock_settings(&mut tx).await?;
        let mut new = old.clone();
        apply(&mut new);
        store_settings(&mut tx, &new).await?;
        tx.commit().await?;
        Ok((old, new))
    }

    /// Appends a log entry and evicts the oldest entries beyond `capacity`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn append_log(&self, log: &NewApiCallLog, capacity: usize) -> Result<i64, SyncError> {
        let mut tx = self.pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO api_call_logs (\"timestamp\", endpoint, method, status, response_body, error, duration_ms) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(log.timestamp)
        .bind(&log.endpoint)
        .bind(&log.method)
        .bind(log.status.map(i32::from))
        .bind(log.response_body.as_ref())
        .bind(log.error.as_deref())
        .bind(log.duration_ms.and_then(|d| i64::try_from(d).ok()))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM api_call_logs WHERE id IN ( \
               SELECT id FROM api_call_logs ORDER BY \"timestamp\" ASC, id ASC \
               LIMIT GREATEST((SELECT count(*) FROM api_call_logs) - $1, 0))",
        )
        .bind(i64::try_from(capacity).unwrap_or(i64::MAX))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Loads up to `limit` log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn recent_logs(&self, limit: usize) -> Result<Vec<ApiCallLog>, SyncError> {
        let rows = sqlx::query_as::<_, ApiCallLogRow>(&format!(
            "SELECT {LOG_COLUMNS} FROM api_call_logs ORDER BY \"timestamp\" DESC, id DESC LIMIT $1"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ApiCallLog::from).collect())
    }

    /// Loads every log entry for `endpoint`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn logs_by_endpoint(&self, endpoint: &str) -> Result<Vec<ApiCallLog>, SyncError> {
        let rows = sqlx::query_as::<_, ApiCallLogRow>(&format!(
            "SELECT {LOG_COLUMNS} FROM api_call_logs WHERE endpoint = $1 \
             ORDER BY \"timestamp\" DESC, id DESC"
        ))
        .bind(endpoint)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ApiCallLog::from).collect())
    }

    /// Deletes every log entry.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on database failure.
    pub async fn clear_logs(&self) -> Result<u64, SyncError> {
        let result = sqlx::query("DELETE FROM api_call_logs")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

async fn upsert_attendee(conn: &mut PgConnection, record: &AttendeeRecord) -> Result<(), SyncError> {
    sqlx::query(
        "INSERT INTO attendees (id, first_name, last_name, email, event_id, raw, synced_at) \
         VALUES ($1, $2, $3, $4, $5, $6::json, now()) \
         ON CONFLICT (id) DO UPDATE SET \
         first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name, \
         email = EXCLUDED.email, event_id = EXCLUDED.event_id, \
         raw = EXCLUDED.raw, synced_at = EXCLUDED.synced_at",
    )
    .bind(record.id.get())
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(&record.email)
    .bind(&record.event_id)
    .bind(serde_json::to_string(&record.raw).map_err(|e| SyncError::Internal(e.to_string()))?)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn count_attendees(conn: &mut PgConnection) -> Result<usize, SyncError> {
    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM attendees")
        .fetch_one(&mut *conn)
        .await?;
    Ok(usize::try_from(total).unwrap_or(0))
}

/// Reads the settings row with `FOR UPDATE`; held until the transaction ends.
async fn lock_settings(conn: &mut PgConnection) -> Result<UserConfig, SyncError> {
    let current: Option<Json<UserConfig>> =
        sqlx::query_scalar("SELECT value FROM user_settings WHERE id = 1 FOR UPDATE")
            .fetch_optional(&mut *conn)
            .await?;
    Ok(current.map(|v| v.0).unwrap_or_default())
}

async fn store_settings(conn: &mut PgConnection, config: &UserConfig) -> Result<(), SyncError> {
    sqlx::query(
        "INSERT INTO user_settings (id, value, updated_at) VALUES (1, $1, now()) \
         ON CONFLICT (id) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
    )
    .bind(Json(config))
    .execute(&mut *conn)
    .await?;
    Ok(())
}
