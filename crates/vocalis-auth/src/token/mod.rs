//! Session-backed token lifecycle.

pub mod service;

pub use service::{IssuedToken, TokenService};
