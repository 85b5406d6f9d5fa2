//! Change notifications for the local store.
//!
//! Every mutation of the settings blob or the attendee collection emits a
//! [`StoreEvent`] through the [`super::EventBus`]. UI clients receive them
//! over the `/ws` endpoint and reload the affected view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserConfig;

/// Coarse event category, used for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEventKind {
    /// Settings blob changed.
    Settings,
    /// Attendee collection changed.
    Attendees,
    /// API call log changed.
    Logs,
}

/// Domain event emitted after every store mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// Emitted after a settings merge-update or clear.
    SettingsChanged {
        /// Settings before the change.
        old: UserConfig,
        /// Settings after the change.
        new: UserConfig,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a successful sync committed its batch.
    AttendeesSynced {
        /// Records received in this sync.
        synced: usize,
        /// Records in the store after the upsert.
        total: usize,
        /// Number of available columns after the rebuild.
        column_count: usize,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after the attendee collection was cleared.
    AttendeesCleared {
        /// Clear timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after the API call log was cleared.
    LogsCleared {
        /// Clear timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl StoreEvent {
    /// Returns the category of this event.
    #[must_use]
    pub const fn kind(&self) -> StoreEventKind {
        match self {
            Self::SettingsChanged { .. } => StoreEventKind::Settings,
            Self::AttendeesSynced { .. } | Self::AttendeesCleared { .. } => {
                StoreEventKind::Attendees
            }
            Self::LogsCleared { .. } => StoreEventKind::Logs,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SettingsChanged { .. } => "settings_changed",
            Self::AttendeesSynced { .. } => "attendees_synced",
            Self::AttendeesCleared { .. } => "attendees_cleared",
            Self::LogsCleared { .. } => "logs_cleared",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_events() {
        let cleared = StoreEvent::AttendeesCleared { timestamp: Utc::now() };
        assert_eq!(cleared.kind(), StoreEventKind::Attendees);
        let logs = StoreEvent::LogsCleared { timestamp: Utc::now() };
        assert_eq!(logs.kind(), StoreEventKind::Logs);
    }

    #[test]
    fn settings_changed_serializes_with_tag() {
        let event = StoreEvent::SettingsChanged {
            old: UserConfig::default(),
            new: UserConfig {
                selected_columns: Some(vec!["email".to_string()]),
                ..UserConfig::default()
            },
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "settings_changed");
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"settings_changed\""));
        assert!(json.contains("email"));
    }
}
