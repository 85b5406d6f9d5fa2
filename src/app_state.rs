//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::{AttendeeService, SyncService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Sync orchestration.
    pub sync_service: Arc<SyncService>,
    /// Views, column and formatter settings.
    pub attendee_service: Arc<AttendeeService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}
