//! Session (issued access token) entities.

pub mod model;

pub use model::{NewSession, Session};
