//! Custom Axum extractors.

pub mod auth;
pub mod client;
pub mod validated;

pub use auth::{AuthUser, BearerToken};
pub use client::{ClientInfo, client_address};
pub use validated::ValidatedJson;
