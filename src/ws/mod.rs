//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` streams local store change notifications so a UI
//! can reload the affected view. Nothing is pushed from Billetweb itself.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
