//! # vocalis-database
//!
//! Persistence for users and sessions. The [`UserStore`] and
//! [`SessionRegistry`] traits are implemented by PostgreSQL repositories
//! for production and by [`MemoryStore`] for tests and local runs.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use repositories::{SessionRepository, UserRepository};
pub use store::{LockoutPolicy, LoginFailure, SessionRegistry, UserStore};
