//! Authentication configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest accepted access token lifetime (one year).
pub const MAX_ACCESS_TTL_MINUTES: u64 = 60 * 24 * 365;

/// Longest accepted refresh token lifetime (ten years).
pub const MAX_REFRESH_TTL_DAYS: u64 = 365 * 10;

/// Largest accepted failed-login threshold.
pub const MAX_FAILED_ATTEMPTS: u32 = 1000;

/// Longest accepted account lockout (one year).
pub const MAX_LOCKOUT_MINUTES: u64 = 60 * 24 * 365;

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256). Generated when absent.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_days: u64,
    /// Consecutive failed logins that lock an account.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: u32,
    /// Account lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    /// Argon2 lanes.
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
    /// Interval between expired-session purges, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub session_cleanup_interval_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_days: default_refresh_ttl(),
            max_failed_attempts: default_max_failed(),
            lockout_duration_minutes: default_lockout(),
            hash_memory_kib: default_hash_memory(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
            session_cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl AuthConfig {
    /// Checks that lifetimes and lockout settings are within their bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        check_range("auth.access_ttl_minutes", self.access_ttl_minutes, MAX_ACCESS_TTL_MINUTES)?;
        check_range("auth.refresh_ttl_days", self.refresh_ttl_days, MAX_REFRESH_TTL_DAYS)?;
        check_range(
            "auth.max_failed_attempts",
            u64::from(self.max_failed_attempts),
            u64::from(MAX_FAILED_ATTEMPTS),
        )?;
        check_range(
            "auth.lockout_duration_minutes",
            self.lockout_duration_minutes,
            MAX_LOCKOUT_MINUTES,
        )?;
        Ok(())
    }
}

/// Rejects `value` outside `1..=max`.
pub(crate) fn check_range(field: &str, value: u64, max: u64) -> Result<(), AppError> {
    if value == 0 || value > max {
        return Err(AppError::configuration(format!(
            "{field} must be between 1 and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Default administrator provisioning on first start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Create an administrator when none exists.
    #[serde(default = "default_true")]
    pub create_default_admin: bool,
    /// Username of the provisioned administrator.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Email of the provisioned administrator.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            create_default_admin: true,
            admin_username: default_admin_username(),
            admin_email: default_admin_email(),
        }
    }
}

fn default_access_ttl() -> u64 {
    60 * 24 * 7
}

fn default_refresh_ttl() -> u64 {
    30
}

fn default_max_failed() -> u32 {
    5
}

fn default_lockout() -> u64 {
    30
}

fn default_hash_memory() -> u32 {
    19 * 1024
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_hash_parallelism() -> u32 {
    1
}

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}
