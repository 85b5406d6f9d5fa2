//! Sync handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::SyncRequest;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SyncError};
use crate::service::SyncOutcome;

/// `POST /sync`: Pull every attendee from Billetweb.
///
/// # Errors
///
/// Returns the [`SyncError`] of the failed sync; local data is unchanged.
#[utoipa::path(
    post,
    path = "/api/v1/sync",
    tag = "Sync",
    summary = "Sync attendees",
    description = "Fetches all attendees from Billetweb, upserts them by id, rebuilds the available columns and reseeds empty column choices. Uses `token` from the body when given, else the stored credential.",
    request_body(content = SyncRequest, description = "Optional one-off credential"),
    responses(
        (status = 200, description = "Sync succeeded", body = SyncOutcome),
        (status = 400, description = "No credential", body = ErrorResponse),
        (status = 409, description = "A sync is already running", body = ErrorResponse),
        (status = 502, description = "Billetweb failure or bad payload", body = ErrorResponse),
    )
)]
pub async fn run_sync(
    State(state): State<AppState>,
    body: Option<Json<SyncRequest>>,
) -> Result<impl IntoResponse, SyncError> {
    let token = body.and_then(|Json(req)| req.token);
    let outcome = match token {
        Some(token) => state.sync_service.sync(&token).await?,
        None => state.sync_service.sync_with_stored_credential().await?,
    };
    Ok(Json(outcome))
}

/// Sync routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sync", post(run_sync))
}
