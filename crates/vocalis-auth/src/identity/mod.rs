//! User identity management.

pub mod service;

pub use service::{IdentityService, LoginAttempt, NewAccount};
