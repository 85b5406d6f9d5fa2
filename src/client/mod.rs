//! Outbound HTTP clients.
//!
//! [`BilletwebClient`] is the only one: a thin wrapper around the Billetweb
//! REST API that returns raw responses and leaves interpretation to the
//! sync service.

pub mod billetweb;

pub use billetweb::{ApiResponse, BilletwebClient, normalize_credential};
