//! Role-based access control for account management operations.

pub mod enforcer;
pub mod policies;

pub use enforcer::RbacEnforcer;
pub use policies::{Permission, role_allows, status_allows};
