//! Settings handlers: API credential and full reset.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::dto::{ClearedResponse, TokenRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SyncError};
use crate::service::TokenStatus;

/// `GET /settings/token`: Whether a credential is stored.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/settings/token",
    tag = "Settings",
    summary = "Credential status",
    description = "Reports whether an API credential is stored. The credential itself is never returned.",
    responses(
        (status = 200, description = "Credential status", body = TokenStatus),
    )
)]
pub async fn token_status(State(state): State<AppState>) -> Result<impl IntoResponse, SyncError> {
    Ok(Json(state.attendee_service.token_status().await?))
}

/// `PUT /settings/token`: Store the API credential.
///
/// # Errors
///
/// Returns [`SyncError::MissingCredential`] for a blank token.
#[utoipa::path(
    put,
    path = "/api/v1/settings/token",
    tag = "Settings",
    summary = "Set credential",
    description = "Stores the Billetweb credential used by `POST /sync` when no one-off token is given.",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Credential stored", body = TokenStatus),
        (status = 400, description = "Blank credential", body = ErrorResponse),
    )
)]
pub async fn set_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, SyncError> {
    Ok(Json(state.attendee_service.set_token(&req.token).await?))
}

/// `DELETE /settings/token`: Forget the API credential.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    delete,
    path = "/api/v1/settings/token",
    tag = "Settings",
    summary = "Clear credential",
    responses(
        (status = 200, description = "Credential removed", body = ClearedResponse),
    )
)]
pub async fn clear_token(State(state): State<AppState>) -> Result<impl IntoResponse, SyncError> {
    state.attendee_service.clear_token().await?;
    Ok(Json(ClearedResponse::new("token")))
}

/// `DELETE /settings`: Reset every setting.
///
/// # Errors
///
/// Returns [`SyncError::Persistence`] on store failure.
#[utoipa::path(
    delete,
    path = "/api/v1/settings",
    tag = "Settings",
    summary = "Reset settings",
    description = "Clears the credential and every column choice. Stored attendees are kept.",
    responses(
        (status = 200, description = "Settings reset", body = ClearedResponse),
    )
)]
pub async fn clear_settings(State(state): State<AppState>) -> Result<impl IntoResponse, SyncError> {
    state.attendee_service.clear_settings().await?;
    Ok(Json(ClearedResponse::new("settings")))
}

/// Settings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", delete(clear_settings))
        .route(
            "/settings/token",
            get(token_status).put(set_token).delete(clear_token),
        )
}
