//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod settings_dto;

pub use common_dto::*;
pub use settings_dto::*;
