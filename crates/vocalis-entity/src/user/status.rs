//! User account status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account status for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account is active and can log in.
    Active,
    /// Account is deactivated by an admin.
    Inactive,
    /// Account is suspended pending review.
    Suspended,
    /// Account awaits activation.
    Pending,
}

impl UserStatus {
    /// All statuses.
    pub const ALL: [UserStatus; 4] = [Self::Active, Self::Inactive, Self::Suspended, Self::Pending];

    /// Check if the user can authenticate with this status.
    pub fn can_login(&self) -> bool {
        match self {
            Self::Active => true,
            Self::Inactive | Self::Suspended | Self::Pending => false,
        }
    }

    /// Check if already-issued tokens may still be used with this status.
    pub fn can_use_tokens(&self) -> bool {
        match self {
            Self::Active => true,
            Self::Inactive | Self::Suspended | Self::Pending => false,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = vocalis_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            "pending" => Ok(Self::Pending),
            _ => Err(vocalis_core::AppError::validation(format!(
                "Invalid user status: '{s}'. Expected one of: active, inactive, suspended, pending"
            ))),
        }
    }
}
