//! # attendee-sync
//!
//! Local sync cache and query API for Billetweb event attendees.
//!
//! A sync pulls every attendee of the account from the Billetweb REST API,
//! upserts them by id and rebuilds the set of known columns from the
//! flattened payloads. The cached records are then served as a searchable
//! table with user-chosen columns and readable status labels.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── SyncService, AttendeeService (service/)
//!     │        │
//!     │        └── BilletwebClient (client/)
//!     │
//!     ├── flatten, columns, search, formatter, EventBus (domain/)
//!     │
//!     └── Store: in-memory or PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;

#[cfg(test)]
pub(crate) mod test_support;
