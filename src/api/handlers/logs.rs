//! API call log handlers.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ClearedResponse, LogParams};
use crate::app_state::AppState;
use crate::domain::ApiCallLog;
use crate::error::{ErrorResponse, SyncError};

/// `GET /logs`: Recent Billetweb calls, newest first.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    tag = "Logs",
    summary = "List API call logs",
    description = "Returns up to `limit` (default 100, max 1000) logged Billetweb calls, newest first, optionally for one endpoint.",
    params(LogParams),
    responses(
        (status = 200, description = "Log entries", body = Vec<ApiCallLog>),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogParams>,
) -> Result<impl IntoResponse, SyncError> {
    let logs = state
        .attendee_service
        .logs(params.clamped_limit(), params.endpoint.as_deref())
        .await?;
    Ok(Json(logs))
}

/// `DELETE /logs`: Remove every log entry.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    delete,
    path = "/api/v1/logs",
    tag = "Logs",
    summary = "Clear API call logs",
    responses(
        (status = 200, description = "Logs cleared", body = ClearedResponse),
    )
)]
pub async fn clear_logs(State(state): State<AppState>) -> Result<impl IntoResponse, SyncError> {
    state.attendee_service.clear_logs().await?;
    Ok(Json(ClearedResponse::new("logs")))
}

/// Log routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/logs", get(list_logs).delete(clear_logs))
}
