//! HTTP-facing layer: the access-controlled append pipeline and the admin
//! surface, as plain axum handlers over the shared stores.

pub mod admin;
pub mod auth;
pub mod error;
pub mod messages;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
