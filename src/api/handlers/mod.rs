//! REST endpoint handlers organized by resource.

pub mod attendees;
pub mod columns;
pub mod formatters;
pub mod logs;
pub mod settings;
pub mod sync;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(attendees::routes())
        .merge(sync::routes())
        .merge(columns::routes())
        .merge(settings::routes())
        .merge(formatters::routes())
        .merge(logs::routes())
}
