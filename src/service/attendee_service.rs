//! Attendee service: table and detail views, column and formatter settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::domain::{
    ApiCallLog, AttendeeId, AttendeeRecord, ColumnSet, ConfigPatch, FlatRecord, ValueFormatter,
    ValueMapping, filter_attendees, format_key_for_display,
};
use crate::error::SyncError;
use crate::persistence::Store;

/// Column header of the attendee table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ColumnHeader {
    /// Column path used for lookup.
    pub key: String,
    /// Display label (`custom.` prefix stripped).
    pub label: String,
}

/// One row of the attendee table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TableRow {
    /// Attendee id.
    #[schema(value_type = i64)]
    pub id: AttendeeId,
    /// Formatted cells, one per header. Missing columns are empty.
    pub cells: Vec<String>,
}

/// Searched attendees projected onto the selected columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendeeTable {
    /// Headers in display order.
    pub headers: Vec<ColumnHeader>,
    /// Matching rows in id order.
    pub rows: Vec<TableRow>,
    /// Number of stored attendees.
    pub total: usize,
    /// Number of rows returned.
    pub matched: usize,
}

/// One flattened field of an attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DetailEntry {
    /// Dotted column path.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Formatted value.
    pub value: String,
    /// Value before formatting.
    pub raw: String,
}

/// Every field of one attendee, in payload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendeeDetail {
    /// Attendee id.
    #[schema(value_type = i64)]
    pub id: AttendeeId,
    /// Flattened fields.
    pub entries: Vec<DetailEntry>,
}

/// Status of the stored API credential. The credential itself is never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TokenStatus {
    /// Whether a credential is stored.
    pub configured: bool,
}

/// Read side of the local cache plus user settings.
#[derive(Debug)]
pub struct AttendeeService {
    store: Arc<Store>,
    formatter: RwLock<ValueFormatter>,
    max_depth: usize,
}

impl AttendeeService {
    /// Creates a new `AttendeeService` using `formatter` for cell values.
    #[must_use]
    pub fn new(store: Arc<Store>, formatter: ValueFormatter, max_depth: usize) -> Self {
        Self {
            store,
            formatter: RwLock::new(formatter),
            max_depth,
        }
    }

    /// Returns a reference to the inner [`Store`].
    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Searches stored attendees and projects them onto the selected columns.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn list(&self, query: &str) -> Result<AttendeeTable, SyncError> {
        let records = self.store.all_attendees().await?;
        let columns = ColumnSet::from(&self.store.settings().await?);
        let matches = filter_attendees(&records, query, &columns.searchable, self.max_depth);

        let formatter = self.formatter.read().await;
        let rows: Vec<TableRow> = matches
            .into_iter()
            .map(|record| TableRow {
                id: record.id,
                cells: self.cells(record, &columns.selected, &formatter),
            })
            .collect();

        Ok(AttendeeTable {
            headers: columns.selected.iter().map(|key| header(key)).collect(),
            total: records.len(),
            matched: rows.len(),
            rows,
        })
    }

    fn cells(
        &self,
        record: &AttendeeRecord,
        columns: &[String],
        formatter: &ValueFormatter,
    ) -> Vec<String> {
        let flat = record.flat(self.max_depth).unwrap_or_else(|e| {
            tracing::warn!(id = %record.id, error = %e, "rendering unflattenable record empty");
            FlatRecord::default()
        });
        columns
            .iter()
            .map(|column| {
                flat.get(column)
                    .map(|raw| formatter.format(column, raw).to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Every flattened field of one attendee, formatted.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AttendeeNotFound`] for an unknown id, or
    /// [`SyncError::MalformedRecord`] if the stored payload nests too deep.
    pub async fn detail(&self, id: AttendeeId) -> Result<AttendeeDetail, SyncError> {
        let record = self.store.attendee(id).await?;
        let formatter = self.formatter.read().await;
        let entries = record
            .flatten(self.max_depth)?
            .into_iter()
            .map(|entry| DetailEntry {
                label: format_key_for_display(&entry.key).to_string(),
                value: formatter.format(&entry.key, &entry.value).to_string(),
                key: entry.key,
                raw: entry.value,
            })
            .collect();
        Ok(AttendeeDetail { id, entries })
    }

    /// Deletes every stored attendee.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn clear_attendees(&self) -> Result<(), SyncError> {
        self.store.clear_attendees().await?;
        tracing::info!("attendees cleared");
        Ok(())
    }

    /// Resolved column lists.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn columns(&self) -> Result<ColumnSet, SyncError> {
        Ok(ColumnSet::from(&self.store.settings().await?))
    }

    /// Replaces the table columns verbatim.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn set_selected_columns(&self, columns: Vec<String>) -> Result<ColumnSet, SyncError> {
        let settings = self.store.update_settings(ConfigPatch::selected(columns)).await?;
        Ok(ColumnSet::from(&settings))
    }

    /// Replaces the search columns verbatim.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn set_searchable_columns(
        &self,
        columns: Vec<String>,
    ) -> Result<ColumnSet, SyncError> {
        let settings = self
            .store
            .update_settings(ConfigPatch::searchable(columns))
            .await?;
        Ok(ColumnSet::from(&settings))
    }

    /// Formats one cell value.
    pub async fn format_cell(&self, column: &str, raw: &str) -> String {
        self.formatter.read().await.format(column, raw).to_string()
    }

    /// Snapshot of every value mapping.
    pub async fn formatter_mappings(&self) -> BTreeMap<String, ValueMapping> {
        self.formatter.read().await.mappings()
    }

    /// Merges `entries` into the mapping of `column` and returns the result.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRequest`] for a blank column name.
    pub async fn register_mapping(
        &self,
        column: &str,
        entries: ValueMapping,
    ) -> Result<ValueMapping, SyncError> {
        if column.trim().is_empty() {
            return Err(SyncError::InvalidRequest(
                "column name must not be empty".to_string(),
            ));
        }
        let mut formatter = self.formatter.write().await;
        formatter.register(column, entries);
        Ok(formatter.mappings().remove(column).unwrap_or_default())
    }

    /// Whether an API credential is stored.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn token_status(&self) -> Result<TokenStatus, SyncError> {
        let settings = self.store.settings().await?;
        Ok(TokenStatus {
            configured: settings
                .api_token
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty()),
        })
    }

    /// Stores the API credential.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingCredential`] for a blank token, or a
    /// [`SyncError::Persistence`] on store failure.
    pub async fn set_token(&self, token: &str) -> Result<TokenStatus, SyncError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SyncError::MissingCredential);
        }
        self.store
            .update_settings(ConfigPatch::api_token(token.to_string()))
            .await?;
        Ok(TokenStatus { configured: true })
    }

    /// Removes the stored API credential.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn clear_token(&self) -> Result<(), SyncError> {
        self.store.clear_api_token().await?;
        Ok(())
    }

    /// Resets every setting, credential included.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn clear_settings(&self) -> Result<(), SyncError> {
        self.store.clear_settings().await
    }

    /// Recent API call logs, newest first, optionally for one endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn logs(
        &self,
        limit: usize,
        endpoint: Option<&str>,
    ) -> Result<Vec<ApiCallLog>, SyncError> {
        match endpoint {
            Some(endpoint) => {
                let mut logs = self.store.logs_by_endpoint(endpoint).await?;
                logs.truncate(limit);
                Ok(logs)
            }
            None => self.store.recent_logs(limit).await,
        }
    }

    /// Deletes every API call log.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::Persistence`] on store failure.
    pub async fn clear_logs(&self) -> Result<(), SyncError> {
        self.store.clear_logs().await
    }
}

fn header(key: &str) -> ColumnHeader {
    ColumnHeader {
        key: key.to_string(),
        label: format_key_for_display(key).to_string(),
    }
}
