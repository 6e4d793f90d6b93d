//! Request throttling configuration: rate limiting and brute-force blocking.

use serde::{Deserialize, Serialize};

use super::auth::check_range;
use crate::error::AppError;

/// Longest accepted throttle window or block (one week).
pub const MAX_THROTTLE_SECONDS: u64 = 60 * 60 * 24 * 7;

/// Per-address sliding-window rate limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the limiter is applied.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests admitted per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Paths never counted or rejected.
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_seconds: default_window(),
            exempt_paths: default_exempt_paths(),
        }
    }
}

/// Per-address failed-authentication blocking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BruteForceConfig {
    /// Whether the guard is applied.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Failures within the window that trigger a block.
    #[serde(default = "default_max_failures")]
    pub max_failures: usize,
    /// Rolling failure window in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Block duration in seconds.
    #[serde(default = "default_block")]
    pub block_seconds: u64,
}

impl RateLimitConfig {
    /// Checks that the quota and window are within their bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        check_range("rate_limit.max_requests", self.max_requests as u64, u64::from(u32::MAX))?;
        check_range("rate_limit.window_seconds", self.window_seconds, MAX_THROTTLE_SECONDS)
    }
}

impl BruteForceConfig {
    /// Checks that the threshold, window, and block are within their bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        check_range("brute_force.max_failures", self.max_failures as u64, u64::from(u32::MAX))?;
        check_range("brute_force.window_seconds", self.window_seconds, MAX_THROTTLE_SECONDS)?;
        check_range("brute_force.block_seconds", self.block_seconds, MAX_THROTTLE_SECONDS)
    }
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failures: default_max_failures(),
            window_seconds: default_window(),
            block_seconds: default_block(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> usize {
    100
}

fn default_window() -> u64 {
    300
}

fn default_exempt_paths() -> Vec<String> {
    vec!["/".to_string(), "/api/health".to_string()]
}

fn default_max_failures() -> usize {
    5
}

fn default_block() -> u64 {
    900
}
