//! Expired session and idle throttle-state cleanup.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use vocalis_core::error::AppError;
use vocalis_database::store::SessionRegistry;

use crate::throttle::{BruteForceGuard, RateLimiter};
use crate::token::TokenService;

/// What one cleanup cycle removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Session rows past their expiry that were deleted.
    pub expired_sessions: u64,
    /// Per-user token locks nobody held.
    pub idle_locks: usize,
    /// Rate-limiter and brute-force entries with no live state.
    pub idle_addresses: usize,
}

/// Handles periodic cleanup of expired sessions and in-memory throttle state.
#[derive(Clone)]
pub struct SessionCleanup {
    sessions: Arc<dyn SessionRegistry>,
    tokens: TokenService,
    rate_limiter: Arc<RateLimiter>,
    brute_force: Arc<BruteForceGuard>,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup").finish()
    }
}

impl SessionCleanup {
    /// Creates a new cleanup handler.
    pub fn new(
        sessions: Arc<dyn SessionRegistry>,
        tokens: TokenService,
        rate_limiter: Arc<RateLimiter>,
        brute_force: Arc<BruteForceGuard>,
    ) -> Self {
        Self {
            sessions,
            tokens,
            rate_limiter,
            brute_force,
        }
    }

    /// Runs one cleanup cycle.
    pub async fn run_cleanup(&self) -> Result<CleanupReport, AppError> {
        let expired_sessions = self.sessions.purge_expired(Utc::now()).await?;
        let idle_locks = self.tokens.prune_idle_locks();

        let idle_addresses = self.prune_throttles().await;

        let report = CleanupReport {
            expired_sessions,
            idle_locks,
            idle_addresses,
        };
        if report != CleanupReport::default() {
            info!(
                expired_sessions,
                idle_locks, idle_addresses, "Session cleanup completed"
            );
        }
        Ok(report)
    }

    /// Drops idle rate-limiter and brute-force entries. Returns how many.
    pub async fn prune_throttles(&self) -> usize {
        let now = Instant::now();
        let pruned = self.rate_limiter.prune(now).await + self.brute_force.prune(now).await;
        if pruned > 0 {
            debug!(pruned, "Idle throttle entries pruned");
        }
        pruned
    }

    /// How often throttle state should be pruned: the shorter throttle window.
    pub fn throttle_prune_interval(&self) -> Duration {
        self.rate_limiter.window().min(self.brute_force.window())
    }
}
