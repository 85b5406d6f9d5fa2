//! Column registry: the dynamic schema derived from synced attendees.
//!
//! The settings blob ([`UserConfig`]) holds three column lists:
//!
//! - `available_columns`: every leaf path seen across the whole attendee
//!   store, sorted, rebuilt from scratch after each sync;
//! - `selected_columns`: table columns, in display order;
//! - `searchable_columns`: columns scanned by the search box.
//!
//! Selected and searchable lists are not validated against the available
//! set. A stale path simply renders empty and never matches.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AttendeeRecord;
use crate::error::SyncError;

/// Table columns used until the user picks some.
pub const DEFAULT_SELECTED_COLUMNS: [&str; 4] = ["firstname", "name", "email", "event_name"];

/// Search columns used until the user picks some.
pub const DEFAULT_SEARCHABLE_COLUMNS: [&str; 3] = ["email", "firstname", "name"];

/// Persisted user settings blob.
///
/// `None` means "never set"; `Some(vec![])` is an explicit empty choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserConfig {
    /// Billetweb API credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Columns shown in the attendee table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_columns: Option<Vec<String>>,
    /// All leaf paths detected at the last sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_columns: Option<Vec<String>>,
    /// Columns searched by [`super::search::filter_attendees`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable_columns: Option<Vec<String>>,
}

/// Partial update of [`UserConfig`]: every `Some` field replaces the stored
/// one, `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConfigPatch {
    /// New API credential.
    #[serde(default)]
    pub api_token: Option<String>,
    /// New table columns.
    #[serde(default)]
    pub selected_columns: Option<Vec<String>>,
    /// New available column set.
    #[serde(default)]
    pub available_columns: Option<Vec<String>>,
    /// New search columns.
    #[serde(default)]
    pub searchable_columns: Option<Vec<String>>,
}

impl ConfigPatch {
    /// Patch replacing the table columns verbatim.
    #[must_use]
    pub fn selected(columns: Vec<String>) -> Self {
        Self {
            selected_columns: Some(columns),
            ..Self::default()
        }
    }

    /// Patch replacing the search columns verbatim.
    #[must_use]
    pub fn searchable(columns: Vec<String>) -> Self {
        Self {
            searchable_columns: Some(columns),
            ..Self::default()
        }
    }

    /// Patch replacing the available column set.
    #[must_use]
    pub fn available(columns: Vec<String>) -> Self {
        Self {
            available_columns: Some(columns),
            ..Self::default()
        }
    }

    /// Patch setting the API credential.
    #[must_use]
    pub fn api_token(token: String) -> Self {
        Self {
            api_token: Some(token),
            ..Self::default()
        }
    }

    /// Returns `true` if applying the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.api_token.is_none()
            && self.selected_columns.is_none()
            && self.available_columns.is_none()
            && self.searchable_columns.is_none()
    }
}

impl UserConfig {
    /// Applies `patch` field by field.
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(token) = patch.api_token {
            self.api_token = Some(token);
        }
        if let Some(columns) = patch.selected_columns {
            self.selected_columns = Some(columns);
        }
        if let Some(columns) = patch.available_columns {
            self.available_columns = Some(columns);
        }
        if let Some(columns) = patch.searchable_columns {
            self.searchable_columns = Some(columns);
        }
    }

    /// Table columns, falling back to [`DEFAULT_SELECTED_COLUMNS`] when never set.
    #[must_use]
    pub fn selected_columns_or_default(&self) -> Vec<String> {
        self.selected_columns
            .clone()
            .unwrap_or_else(|| owned(&DEFAULT_SELECTED_COLUMNS))
    }

    /// Search columns, falling back to [`DEFAULT_SEARCHABLE_COLUMNS`] when never set.
    #[must_use]
    pub fn searchable_columns_or_default(&self) -> Vec<String> {
        self.searchable_columns
            .clone()
            .unwrap_or_else(|| owned(&DEFAULT_SEARCHABLE_COLUMNS))
    }

    /// Copy with the API credential masked, for anything leaving the process.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            api_token: self.api_token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }

    /// Available columns; empty before the first sync.
    #[must_use]
    pub fn available_columns_or_empty(&self) -> Vec<String> {
        self.available_columns.clone().unwrap_or_default()
    }
}

/// Resolved view of the three column lists, as served to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ColumnSet {
    /// Sorted leaf paths seen at the last sync.
    pub available: Vec<String>,
    /// Table columns in display order.
    pub selected: Vec<String>,
    /// Search columns.
    pub searchable: Vec<String>,
}

impl From<&UserConfig> for ColumnSet {
    fn from(config: &UserConfig) -> Self {
        Self {
            available: config.available_columns_or_empty(),
            selected: config.selected_columns_or_default(),
            searchable: config.searchable_columns_or_default(),
        }
    }
}

/// Unions the leaf paths of every record into a lexicographically sorted list.
///
/// # Errors
///
/// Returns [`SyncError::MalformedRecord`] if any record nests deeper than
/// `max_depth`.
pub fn rebuild_available_columns<'a, I>(records: I, max_depth: usize) -> Result<Vec<String>, SyncError>
where
    I: IntoIterator<Item = &'a AttendeeRecord>,
{
    let mut columns = BTreeSet::new();
    for record in records {
        for entry in record.flatten(max_depth)? {
            columns.insert(entry.key);
        }
    }
    Ok(columns.into_iter().collect())
}

/// Post-sync reconciliation: reseeds the default table and search columns
/// when the stored lists are absent or empty.
///
/// Pure; the caller applies the returned patch (which may be empty).
#[must_use]
pub fn reconcile_defaults(config: &UserConfig) -> ConfigPatch {
    let missing = |columns: &Option<Vec<String>>| columns.as_ref().is_none_or(Vec::is_empty);
    ConfigPatch {
        selected_columns: missing(&config.selected_columns)
            .then(|| owned(&DEFAULT_SELECTED_COLUMNS)),
        searchable_columns: missing(&config.searchable_columns)
            .then(|| owned(&DEFAULT_SEARCHABLE_COLUMNS)),
        ..ConfigPatch::default()
    }
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> AttendeeRecord {
        let Ok(record) = AttendeeRecord::from_api(value) else {
            panic!("invalid fixture");
        };
        record
    }

    fn strings(items: &[&str]) -> Vec<String> {
        owned(items)
    }

    #[test]
    fn rebuild_unions_and_sorts() {
        let records = vec![
            record(json!({"id": "1", "name": "A", "custom": {"phone": "1"}})),
            record(json!({"id": "2", "email": "b@x", "name": "B"})),
        ];
        let Ok(columns) = rebuild_available_columns(&records, 32) else {
            panic!("rebuild failed");
        };
        assert_eq!(columns, strings(&["custom.phone", "email", "id", "name"]));
    }

    #[test]
    fn rebuild_of_nothing_is_empty() {
        let empty: Vec<AttendeeRecord> = Vec::new();
        let Ok(columns) = rebuild_available_columns(&empty, 32) else {
            panic!("rebuild failed");
        };
        assert!(columns.is_empty());
    }

    #[test]
    fn defaults_apply_only_when_never_set() {
        let config = UserConfig::default();
        assert_eq!(config.selected_columns_or_default(), strings(&DEFAULT_SELECTED_COLUMNS));
        assert_eq!(config.searchable_columns_or_default(), strings(&DEFAULT_SEARCHABLE_COLUMNS));

        let explicit = UserConfig {
            selected_columns: Some(Vec::new()),
            searchable_columns: Some(strings(&["custom.phone"])),
            ..UserConfig::default()
        };
        assert!(explicit.selected_columns_or_default().is_empty());
        assert_eq!(explicit.searchable_columns_or_default(), strings(&["custom.phone"]));
    }

    #[test]
    fn merge_replaces_only_patched_fields() {
        let mut config = UserConfig {
            api_token: Some("tok".to_string()),
            selected_columns: Some(strings(&["email"])),
            ..UserConfig::default()
        };
        config.merge(ConfigPatch::searchable(strings(&["name", "email"])));
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.selected_columns, Some(strings(&["email"])));
        assert_eq!(config.searchable_columns, Some(strings(&["name", "email"])));
    }

    #[test]
    fn set_selected_is_verbatim() {
        let mut config = UserConfig::default();
        config.merge(ConfigPatch::selected(strings(&["zeta", "alpha", "gone.column"])));
        assert_eq!(
            ColumnSet::from(&config).selected,
            strings(&["zeta", "alpha", "gone.column"])
        );
    }

    #[test]
    fn reconcile_seeds_absent_lists() {
        let patch = reconcile_defaults(&UserConfig::default());
        assert_eq!(patch.selected_columns, Some(strings(&DEFAULT_SELECTED_COLUMNS)));
        assert_eq!(patch.searchable_columns, Some(strings(&DEFAULT_SEARCHABLE_COLUMNS)));
        assert!(patch.available_columns.is_none());
        assert!(patch.api_token.is_none());
    }

    #[test]
    fn reconcile_reseeds_explicitly_cleared_lists() {
        let config = UserConfig {
            selected_columns: Some(Vec::new()),
            searchable_columns: Some(strings(&["email"])),
            ..UserConfig::default()
        };
        let patch = reconcile_defaults(&config);
        assert_eq!(patch.selected_columns, Some(strings(&DEFAULT_SELECTED_COLUMNS)));
        assert!(patch.searchable_columns.is_none());
    }

    #[test]
    fn reconcile_leaves_populated_config_alone() {
        let config = UserConfig {
            selected_columns: Some(strings(&["a"])),
            searchable_columns: Some(strings(&["b"])),
            ..UserConfig::default()
        };
        assert!(reconcile_defaults(&config).is_empty());
    }

    #[test]
    fn redacted_masks_token_only() {
        let config = UserConfig {
            api_token: Some("secret".to_string()),
            selected_columns: Some(strings(&["email"])),
            ..UserConfig::default()
        };
        let masked = config.redacted();
        assert_eq!(masked.api_token.as_deref(), Some("********"));
        assert_eq!(masked.selected_columns, config.selected_columns);
        assert!(UserConfig::default().redacted().api_token.is_none());
    }

    #[test]
    fn user_config_serializes_without_unset_fields() {
        let config = UserConfig {
            selected_columns: Some(strings(&["email"])),
            ..UserConfig::default()
        };
        let Ok(json) = serde_json::to_value(&config) else {
            panic!("serialization failed");
        };
        assert_eq!(json, json!({"selected_columns": ["email"]}));
    }
}
