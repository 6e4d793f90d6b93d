//! Per-address blocking after repeated authentication failures.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{info, warn};

use vocalis_core::config::BruteForceConfig;
use vocalis_core::error::AppError;

#[derive(Debug, Default)]
struct AddressState {
    /// Failure instants inside the rolling window, oldest first.
    failures: VecDeque<Instant>,
    blocked_until: Option<Instant>,
}

/// Blocks addresses that fail authentication too often.
///
/// An address is blocked once `max_failures` failures fall inside the
/// rolling window. The block lifts on its own after the block duration.
#[derive(Debug)]
pub struct BruteForceGuard {
    max_failures: usize,
    window: Duration,
    block: Duration,
    state: Mutex<HashMap<String, AddressState>>,
}

impl BruteForceGuard {
    /// Creates a guard.
    pub fn new(max_failures: usize, window: Duration, block: Duration) -> Self {
        Self {
            max_failures,
            window,
            block,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a guard from configuration.
    pub fn from_config(config: &BruteForceConfig) -> Self {
        Self::new(
            config.max_failures,
            Duration::from_secs(config.window_seconds),
            Duration::from_secs(config.block_seconds),
        )
    }

    /// Rolling failure window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Fails with `TemporarilyBlocked` while the address is blocked.
    pub async fn check(&self, address: &str) -> Result<(), AppError> {
        self.check_at(address, Instant::now()).await
    }

    /// [`Self::check`] at an explicit instant.
    pub async fn check_at(&self, address: &str, now: Instant) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let Some(blocked_until) = state.get(address).map(|entry| entry.blocked_until) else {
            return Ok(());
        };
        match blocked_until {
            Some(until) if until > now => Err(AppError::temporarily_blocked(
                "Too many failed attempts, temporarily blocked",
                until - now,
            )),
            Some(_) => {
                state.remove(address);
                info!(client = %address, "Address block expired");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Records a failed authentication. Returns `true` when this failure blocked the address.
    pub async fn record_failure(&self, address: &str) -> bool {
        self.record_failure_at(address, Instant::now()).await
    }

    /// [`Self::record_failure`] at an explicit instant.
    pub async fn record_failure_at(&self, address: &str, now: Instant) -> bool {
        let mut state = self.state.lock().await;
        let entry = state.entry(address.to_string()).or_default();
        if entry.blocked_until.is_some_and(|until| until > now) {
            return false;
        }
        entry.blocked_until = None;

        entry.failures.push_back(now);
        while entry
            .failures
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            entry.failures.pop_front();
        }

        if entry.failures.len() >= self.max_failures {
            entry.failures.clear();
            entry.blocked_until = Some(now + self.block);
            warn!(
                client = %address,
                block_seconds = self.block.as_secs(),
                "Address blocked after repeated authentication failures"
            );
            true
        } else {
            false
        }
    }

    /// Clears the failure history of an address that is not blocked.
    pub async fn record_success(&self, address: &str) {
        let mut state = self.state.lock().await;
        if state
            .get(address)
            .is_some_and(|entry| entry.blocked_until.is_none())
        {
            state.remove(address);
        }
    }

    /// Drops addresses with neither a live block nor recent failures.
    pub async fn prune(&self, now: Instant) -> usize {
        let mut state = self.state.lock().await;
        let before = state.len();
        state.retain(|_, entry| {
            let blocked = entry.blocked_until.is_some_and(|until| until > now);
            let recent = entry
                .failures
                .back()
                .is_some_and(|t| now.saturating_duration_since(*t) < self.window);
            blocked || recent
        });
        before - state.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocalis_core::error::ErrorKind;

    fn guard() -> BruteForceGuard {
        BruteForceGuard::new(5, Duration::from_secs(300), Duration::from_secs(900))
    }

    #[tokio::test]
    async fn blocks_on_fifth_failure_then_lifts() {
        let guard = guard();
        let start = Instant::now();

        for i in 0..4 {
            assert!(!guard.record_failure_at("10.1.1.1", start + Duration::from_secs(i)).await);
            assert!(guard.check_at("10.1.1.1", start + Duration::from_secs(i)).await.is_ok());
        }
        assert!(guard.record_failure_at("10.1.1.1", start + Duration::from_secs(4)).await);

        let err = guard
            .check_at("10.1.1.1", start + Duration::from_secs(104))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TemporarilyBlocked);
        assert_eq!(err.retry_after, Some(Duration::from_secs(800)));

        assert!(guard.check_at("10.1.1.2", start).await.is_ok());
        assert!(guard.check_at("10.1.1.1", start + Duration::from_secs(904)).await.is_ok());
    }

    #[tokio::test]
    async fn failures_outside_window_do_not_count() {
        let guard = guard();
        let start = Instant::now();
        for i in 0..4 {
            guard.record_failure_at("a", start + Duration::from_secs(i)).await;
        }
        // The first four have aged out.
        let later = start + Duration::from_secs(400);
        assert!(!guard.record_failure_at("a", later).await);
        assert!(guard.check_at("a", later).await.is_ok());
    }

    #[tokio::test]
    async fn success_resets_warming_address() {
        let guard = guard();
        let start = Instant::now();
        for i in 0..4 {
            guard.record_failure_at("b", start + Duration::from_secs(i)).await;
        }
        guard.record_success("b").await;
        assert!(!guard.record_failure_at("b", start + Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn success_does_not_lift_block() {
        let guard = guard();
        let start = Instant::now();
        for i in 0..5 {
            guard.record_failure_at("c", start + Duration::from_secs(i)).await;
        }
        guard.record_success("c").await;
        assert!(guard.check_at("c", start + Duration::from_secs(10)).await.is_err());
    }

    #[tokio::test]
    async fn prune_keeps_blocked_addresses() {
        let guard = guard();
        let start = Instant::now();
        for i in 0..5 {
            guard.record_failure_at("blocked", start + Duration::from_secs(i)).await;
        }
        guard.record_failure_at("idle", start).await;

        assert_eq!(guard.prune(start + Duration::from_secs(600)).await, 1);
        assert!(guard.check_at("blocked", start + Duration::from_secs(600)).await.is_err());
    }
}
