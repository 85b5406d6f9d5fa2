//! OpenAPI document of the REST API.

use utoipa::OpenApi;

use crate::api::dto::{
    ClearedResponse, ColumnsRequest, FormattedCell, MappingRequest, MappingResponse, SyncRequest,
    TokenRequest,
};
use crate::api::handlers::system::HealthResponse;
use crate::domain::{ApiCallLog, ColumnSet, FlattenedEntry};
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::{
    AttendeeDetail, AttendeeTable, ColumnHeader, DetailEntry, SyncOutcome, TableRow, TokenStatus,
};

/// OpenAPI document for the REST API, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "attendee-sync API",
        description = "Local cache, search and settings for Billetweb attendees.",
        license(name = "MIT")
    ),
    paths(
        crate::api::handlers::attendees::list_attendees,
        crate::api::handlers::attendees::get_attendee,
        crate::api::handlers::attendees::clear_attendees,
        crate::api::handlers::sync::run_sync,
        crate::api::handlers::columns::get_columns,
        crate::api::handlers::columns::set_selected,
        crate::api::handlers::columns::set_searchable,
        crate::api::handlers::settings::token_status,
        crate::api::handlers::settings::set_token,
        crate::api::handlers::settings::clear_token,
        crate::api::handlers::settings::clear_settings,
        crate::api::handlers::formatters::list_mappings,
        crate::api::handlers::formatters::format_value,
        crate::api::handlers::formatters::register_mapping,
        crate::api::handlers::logs::list_logs,
        crate::api::handlers::logs::clear_logs,
        crate::api::handlers::system::health_handler,
    ),
    components(schemas(
        AttendeeTable, TableRow, ColumnHeader, AttendeeDetail, DetailEntry, FlattenedEntry,
        SyncRequest, SyncOutcome, ColumnSet, ColumnsRequest, TokenRequest, TokenStatus,
        MappingRequest, MappingResponse, FormattedCell, ApiCallLog, ClearedResponse,
        HealthResponse, ErrorResponse, ErrorBody,
    )),
    tags(
        (name = "Attendees", description = "Cached attendee views"),
        (name = "Sync", description = "Pull from Billetweb"),
        (name = "Columns", description = "Column registry"),
        (name = "Settings", description = "Credential and reset"),
        (name = "Formatters", description = "Cell value labels"),
        (name = "Logs", description = "Billetweb call log"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
