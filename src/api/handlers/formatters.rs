//! Value formatter handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{FormatParams, FormattedCell, MappingRequest, MappingResponse};
use crate::app_state::AppState;
use crate::domain::format_key_for_display;
use crate::error::{ErrorResponse, SyncError};

/// `GET /formatters`: Every registered value mapping.
#[utoipa::path(
    get,
    path = "/api/v1/formatters",
    tag = "Formatters",
    summary = "List value mappings",
    description = "Returns the raw value to label tables, keyed by column.",
    responses(
        (status = 200, description = "Mappings by column", body = std::collections::BTreeMap<String, std::collections::BTreeMap<String, String>>),
    )
)]
pub async fn list_mappings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.attendee_service.formatter_mappings().await)
}

/// `GET /formatters/{column}`: Format one cell value.
#[utoipa::path(
    get,
    path = "/api/v1/formatters/{column}",
    tag = "Formatters",
    summary = "Format a value",
    description = "Returns the display label of `column` and the formatted form of `value`. Unmapped values pass through.",
    params(
        ("column" = String, Path, description = "Column path"),
        FormatParams,
    ),
    responses(
        (status = 200, description = "Formatted cell", body = FormattedCell),
    )
)]
pub async fn format_value(
    State(state): State<AppState>,
    Path(column): Path<String>,
    Query(params): Query<FormatParams>,
) -> impl IntoResponse {
    let formatted = state
        .attendee_service
        .format_cell(&column, &params.value)
        .await;
    Json(FormattedCell {
        label: format_key_for_display(&column).to_string(),
        column,
        raw: params.value,
        formatted,
    })
}

/// `PUT /formatters/{column}`: Merge entries into a column's mapping.
///
/// # Errors
///
/// Returns [`SyncError::InvalidRequest`] for a blank column.
#[utoipa::path(
    put,
    path = "/api/v1/formatters/{column}",
    tag = "Formatters",
    summary = "Merge a value mapping",
    description = "Adds the given entries to the column's mapping; entries for the same raw value are overridden, others kept.",
    params(
        ("column" = String, Path, description = "Column path"),
    ),
    request_body = MappingRequest,
    responses(
        (status = 200, description = "Mapping after merge", body = MappingResponse),
        (status = 400, description = "Invalid column", body = ErrorResponse),
    )
)]
pub async fn register_mapping(
    State(state): State<AppState>,
    Path(column): Path<String>,
    Json(req): Json<MappingRequest>,
) -> Result<impl IntoResponse, SyncError> {
    let mappings = state
        .attendee_service
        .register_mapping(&column, req.mappings)
        .await?;
    Ok(Json(MappingResponse { column, mappings }))
}

/// Formatter routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/formatters", get(list_mappings))
        .route(
            "/formatters/{column}",
            get(format_value).put(register_mapping),
        )
}
