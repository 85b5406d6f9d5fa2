//! Request and response types of the column, token and formatter endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ValueMapping;

/// Body of `PUT /columns/selected` and `PUT /columns/searchable`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ColumnsRequest {
    /// Column paths, stored verbatim in the given order.
    pub columns: Vec<String>,
}

/// Body of `PUT /settings/token`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// Billetweb API credential, with or without the `Basic ` prefix.
    pub token: String,
}

/// Body of `PUT /formatters/{column}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MappingRequest {
    /// Raw value to label entries merged into the column's mapping.
    #[schema(value_type = std::collections::BTreeMap<String, String>)]
    pub mappings: ValueMapping,
}

/// Response of `PUT /formatters/{column}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MappingResponse {
    /// Column path.
    pub column: String,
    /// Full mapping after the merge.
    #[schema(value_type = std::collections::BTreeMap<String, String>)]
    pub mappings: ValueMapping,
}

/// Query parameters of `GET /formatters/{column}`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FormatParams {
    /// Raw cell value to format.
    #[serde(default)]
    pub value: String,
}

/// Response of `GET /formatters/{column}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormattedCell {
    /// Column path.
    pub column: String,
    /// Display label of the column.
    pub label: String,
    /// Value as stored.
    pub raw: String,
    /// Value as displayed.
    pub formatted: String,
}
