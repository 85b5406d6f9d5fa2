//! Column registry handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::ColumnsRequest;
use crate::app_state::AppState;
use crate::domain::ColumnSet;
use crate::error::{ErrorResponse, SyncError};

/// `GET /columns`: Available, selected and searchable columns.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/columns",
    tag = "Columns",
    summary = "Get columns",
    description = "Returns the sorted available columns and the selected and searchable choices, defaults applied when never set.",
    responses(
        (status = 200, description = "Column set", body = ColumnSet),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn get_columns(State(state): State<AppState>) -> Result<impl IntoResponse, SyncError> {
    Ok(Json(state.attendee_service.columns().await?))
}

/// `PUT /columns/selected`: Replace the table columns.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    put,
    path = "/api/v1/columns/selected",
    tag = "Columns",
    summary = "Set table columns",
    description = "Stores the given columns verbatim. Unknown columns are kept and render empty.",
    request_body = ColumnsRequest,
    responses(
        (status = 200, description = "Updated column set", body = ColumnSet),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn set_selected(
    State(state): State<AppState>,
    Json(req): Json<ColumnsRequest>,
) -> Result<impl IntoResponse, SyncError> {
    Ok(Json(state.attendee_service.set_selected_columns(req.columns).await?))
}

/// `PUT /columns/searchable`: Replace the search columns.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    put,
    path = "/api/v1/columns/searchable",
    tag = "Columns",
    summary = "Set search columns",
    description = "Stores the given columns verbatim. An empty list disables search matches until the next sync reseeds the defaults.",
    request_body = ColumnsRequest,
    responses(
        (status = 200, description = "Updated column set", body = ColumnSet),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn set_searchable(
    State(state): State<AppState>,
    Json(req): Json<ColumnsRequest>,
) -> Result<impl IntoResponse, SyncError> {
    Ok(Json(
        state
            .attendee_service
            .set_searchable_columns(req.columns)
            .await?,
    ))
}

/// Column routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/columns", get(get_columns))
        .route("/columns/selected", put(set_selected))
        .route("/columns/searchable", put(set_searchable))
}
