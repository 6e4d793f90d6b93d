//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;
use super::status::UserStatus;

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role (RBAC).
    pub role: UserRole,
    /// Account status.
    pub status: UserStatus,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Reference to the profile picture, if any.
    pub profile_picture: Option<String>,
    /// Free-form user settings (JSON object).
    pub settings: serde_json::Value,
    /// Number of consecutive failed login attempts.
    pub failed_login_attempts: i32,
    /// Account locked until this time (if locked).
    pub locked_until: Option<DateTime<Utc>>,
    /// Last successful login time.
    pub last_login: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account is locked at the given instant.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Check if the user may authenticate at the given instant.
    pub fn can_login_at(&self, now: DateTime<Utc>) -> bool {
        self.status.can_login() && !self.is_locked_at(now)
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
    /// Initial status.
    pub status: UserStatus,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Profile picture reference.
    pub profile_picture: Option<String>,
    /// Initial settings object.
    pub settings: serde_json::Value,
}

/// Optional filters for listing users.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFilter {
    /// Only users with this role.
    pub role: Option<UserRole>,
    /// Only users with this status.
    pub status: Option<UserStatus>,
}

impl UserFilter {
    /// Whether the given user passes the filter.
    pub fn matches(&self, user: &User) -> bool {
        self.role.is_none_or(|role| user.role == role)
            && self.status.is_none_or(|status| user.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            role: UserRole::User,
            status: UserStatus::Active,
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            profile_picture: None,
            settings: serde_json::json!({}),
            failed_login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serialized_user_omits_password_hash() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn lock_expires() {
        let now = Utc::now();
        let mut user = sample();
        user.locked_until = Some(now + Duration::minutes(30));
        assert!(user.is_locked_at(now));
        assert!(!user.can_login_at(now));
        assert!(!user.is_locked_at(now + Duration::minutes(31)));
        assert!(user.can_login_at(now + Duration::minutes(31)));
    }

    #[test]
    fn filter_matches_role_and_status() {
        let user = sample();
        assert!(UserFilter::default().matches(&user));
        let admins = UserFilter {
            role: Some(UserRole::Admin),
            status: None,
        };
        assert!(!admins.matches(&user));
        let active_users = UserFilter {
            role: Some(UserRole::User),
            status: Some(UserStatus::Active),
        };
        assert!(active_users.matches(&user));
    }
}
