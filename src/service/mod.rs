//! Service layer: business logic orchestration.
//!
//! [`SyncService`] pulls attendees from Billetweb into the store.
//! [`AttendeeService`] serves the table, detail and settings views.

pub mod attendee_service;
pub mod sync_service;

pub use attendee_service::{
    AttendeeDetail, AttendeeService, AttendeeTable, ColumnHeader, DetailEntry, TableRow,
    TokenStatus,
};
pub use sync_service::{SyncOutcome, SyncService};
