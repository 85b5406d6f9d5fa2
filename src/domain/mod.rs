//! Domain layer: attendee model, dynamic columns, search and formatting.
//!
//! Everything here is synchronous and side-effect free except the
//! [`EventBus`], which only fans out notifications.

pub mod api_log;
pub mod attendee;
pub mod attendee_id;
pub mod columns;
pub mod event_bus;
pub mod flatten;
pub mod formatter;
pub mod search;
pub mod store_event;

pub use api_log::{ApiCallLog, NewApiCallLog};
pub use attendee::AttendeeRecord;
pub use attendee_id::AttendeeId;
pub use columns::{ColumnSet, ConfigPatch, UserConfig};
pub use event_bus::EventBus;
pub use flatten::{FlatRecord, FlattenedEntry, flatten, format_key_for_display};
pub use formatter::{ValueFormatter, ValueMapping};
pub use search::filter_attendees;
pub use store_event::{StoreEvent, StoreEventKind};
