//! Attendee handlers: table view, detail view and bulk clear.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ClearedResponse, SearchParams};
use crate::app_state::AppState;
use crate::domain::AttendeeId;
use crate::error::{ErrorResponse, SyncError};
use crate::service::{AttendeeDetail, AttendeeTable};

/// `GET /attendees`: Searched attendees projected onto the selected columns.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/attendees",
    tag = "Attendees",
    summary = "List attendees",
    description = "Returns stored attendees whose searchable columns contain `q` (case-insensitive), projected onto the selected columns with formatted cells.",
    params(SearchParams),
    responses(
        (status = 200, description = "Attendee table", body = AttendeeTable),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn list_attendees(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, SyncError> {
    let table = state.attendee_service.list(&params.q).await?;
    Ok(Json(table))
}

/// `GET /attendees/{id}`: Every flattened field of one attendee.
///
/// # Errors
///
/// Returns [`SyncError::InvalidRequest`] for a non-integer id and
/// [`SyncError::AttendeeNotFound`] for an unknown one.
#[utoipa::path(
    get,
    path = "/api/v1/attendees/{id}",
    tag = "Attendees",
    summary = "Get attendee details",
    description = "Returns every flattened field of one attendee in payload order, with display labels and formatted values.",
    params(
        ("id" = i64, Path, description = "Billetweb attendee id"),
    ),
    responses(
        (status = 200, description = "Attendee details", body = AttendeeDetail),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Attendee not found", body = ErrorResponse),
    )
)]
pub async fn get_attendee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, SyncError> {
    let id: AttendeeId = id
        .parse()
        .map_err(|_| SyncError::InvalidRequest(format!("invalid attendee id: {id}")))?;
    let detail = state.attendee_service.detail(id).await?;
    Ok(Json(detail))
}

/// `DELETE /attendees`: Remove every stored attendee.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    delete,
    path = "/api/v1/attendees",
    tag = "Attendees",
    summary = "Clear attendees",
    description = "Deletes every stored attendee and emits an AttendeesCleared event. Column settings are kept.",
    responses(
        (status = 200, description = "Attendees cleared", body = ClearedResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn clear_attendees(State(state): State<AppState>) -> Result<impl IntoResponse, SyncError> {
    state.attendee_service.clear_attendees().await?;
    Ok(Json(ClearedResponse::new("attendees")))
}

/// Attendee routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attendees", get(list_attendees).delete(clear_attendees))
        .route("/attendees/{id}", get(get_attendee))
}
