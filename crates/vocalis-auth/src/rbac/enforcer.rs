//! RBAC enforcement: checks whether a user may perform an operation.

use vocalis_core::error::AppError;
use vocalis_entity::user::User;

use super::policies::{Permission, role_allows, status_allows};

/// Enforces role and status policies for account operations.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer;

impl RbacEnforcer {
    /// Creates a new enforcer.
    pub fn new() -> Self {
        Self
    }

    /// Returns whether the user's status and role grant the permission.
    pub fn has_permission(&self, user: &User, permission: Permission) -> bool {
        status_allows(user.status) && role_allows(user.role, permission)
    }

    /// Checks the permission, failing with an authorization error when denied.
    pub fn require_permission(&self, user: &User, permission: Permission) -> Result<(), AppError> {
        if !status_allows(user.status) {
            return Err(AppError::authorization(format!(
                "Account is {}",
                user.status
            )));
        }
        if role_allows(user.role, permission) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{}' is not permitted to perform this operation",
                user.role
            )))
        }
    }
}
