//! # vocalis-api
//!
//! HTTP API layer for Vocalis built on Axum.
//!
//! Provides the authentication and account-management endpoints, the
//! throttling and security-header middleware, extractors, DTOs, and the
//! mapping from [`vocalis_core::AppError`] to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
