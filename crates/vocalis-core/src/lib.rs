//! # vocalis-core
//!
//! Core crate for the Vocalis trust and access-control backend. Contains
//! configuration schemas, secret resolution, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Vocalis crates.

pub mod config;
pub mod error;
pub mod result;
pub mod secret;

pub use config::AppConfig;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
