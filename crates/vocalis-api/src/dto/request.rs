//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use vocalis_entity::user::{UserRole, UserStatus};

/// Usernames: letters, digits, underscore, hyphen.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset").with_message(
            "Username may only contain letters, digits, underscores and hyphens".into(),
        ))
    }
}

/// Self-registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username.
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3 to 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plaintext password; complexity is checked separately.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Given name.
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username_or_email")]
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub identifier: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Self-service profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// Given name.
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    /// Family name.
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// Replacement settings object.
    pub settings: Option<serde_json::Value>,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password; complexity is checked separately.
    pub new_password: String,
}

/// Create user request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    /// Username.
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3 to 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Assigned role.
    pub role: UserRole,
    /// Initial status; active when omitted.
    #[serde(default)]
    pub status: Option<UserStatus>,
    /// Given name.
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
}

/// Update user request (admin). Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    /// Username.
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3 to 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// Role.
    pub role: Option<UserRole>,
    /// Status.
    pub status: Option<UserStatus>,
    /// Given name.
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    /// Family name.
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
}

/// Query parameters for the admin user listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersQuery {
    /// Only users with this role.
    pub role: Option<UserRole>,
    /// Only users with this status.
    pub status: Option<UserStatus>,
    /// Page size (default 100, at most 1000).
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "Alice#2024".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
        }
    }

    #[test]
    fn accepts_well_formed_registration() {
        assert!(registration("alice_01-x", "alice@example.com").validate().is_ok());
    }

    #[test]
    fn rejects_bad_usernames_and_emails() {
        assert!(registration("al", "alice@example.com").validate().is_err());
        assert!(registration("alice smith", "alice@example.com").validate().is_err());
        assert!(registration("alice!", "alice@example.com").validate().is_err());
        assert!(registration(&"a".repeat(51), "alice@example.com").validate().is_err());
        assert!(registration("alice", "not-an-email").validate().is_err());
    }

    #[test]
    fn login_accepts_legacy_field_name() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username_or_email":"alice","password":"x"}"#).unwrap();
        assert_eq!(req.identifier, "alice");
    }

    #[test]
    fn partial_update_validates_present_fields_only() {
        assert!(UpdateProfileRequest::default().validate().is_ok());
        let bad = UpdateProfileRequest {
            email: Some("nope".into()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
