//! Role and status permission tables.

use serde::{Deserialize, Serialize};

use vocalis_entity::user::{UserRole, UserStatus};

/// An account-management permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// List and filter all users.
    ListUsers,
    /// Read any user's profile.
    ViewUser,
    /// Create users with an arbitrary role.
    CreateUser,
    /// Update any user, including role and status.
    UpdateUser,
    /// Delete users.
    DeleteUser,
    /// Read and edit one's own profile and password.
    ManageOwnProfile,
}

impl Permission {
    /// All permissions.
    pub const ALL: [Permission; 6] = [
        Permission::ListUsers,
        Permission::ViewUser,
        Permission::CreateUser,
        Permission::UpdateUser,
        Permission::DeleteUser,
        Permission::ManageOwnProfile,
    ];
}

/// Whether `role` grants `permission`.
pub fn role_allows(role: UserRole, permission: Permission) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::Moderator => matches!(
            permission,
            Permission::ViewUser | Permission::ManageOwnProfile
        ),
        UserRole::User => matches!(permission, Permission::ManageOwnProfile),
    }
}

/// Whether an account in `status` may exercise any permission at all.
pub fn status_allows(status: UserStatus) -> bool {
    status.can_use_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_permission() {
        for permission in Permission::ALL {
            assert!(role_allows(UserRole::Admin, permission));
        }
    }

    #[test]
    fn moderator_may_only_view() {
        let granted: Vec<_> = Permission::ALL
            .into_iter()
            .filter(|p| role_allows(UserRole::Moderator, *p))
            .collect();
        assert_eq!(
            granted,
            vec![Permission::ViewUser, Permission::ManageOwnProfile]
        );
    }

    #[test]
    fn user_manages_only_own_profile() {
        for permission in Permission::ALL {
            assert_eq!(
                role_allows(UserRole::User, permission),
                permission == Permission::ManageOwnProfile
            );
        }
    }

    #[test]
    fn only_active_status_is_allowed() {
        for status in UserStatus::ALL {
            assert_eq!(status_allows(status), status == UserStatus::Active);
        }
    }
}
