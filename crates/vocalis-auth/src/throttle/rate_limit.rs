//! Sliding-window rate limiter keyed by client address.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;

use vocalis_core::config::RateLimitConfig;
use vocalis_core::error::AppError;

/// Quota state reported for an admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Requests admitted per window.
    pub limit: usize,
    /// Requests still available in the current window.
    pub remaining: usize,
    /// Time until the oldest counted request leaves the window.
    pub reset_after: Duration,
}

/// In-memory sliding-window rate limiter.
///
/// Each address owns a queue of admission instants. Instants older than
/// the window are evicted on every check.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// Address → admission instants, oldest first.
    entries: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter admitting `max_requests` per `window`.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a limiter from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_requests,
            Duration::from_secs(config.window_seconds),
        )
    }

    /// The window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts a request from `key`, rejecting it when the quota is spent.
    pub async fn check(&self, key: &str) -> Result<RateLimitStatus, AppError> {
        self.check_at(key, Instant::now()).await
    }

    /// [`Self::check`] at an explicit instant.
    pub async fn check_at(&self, key: &str, now: Instant) -> Result<RateLimitStatus, AppError> {
        let mut entries = self.entries.lock().await;
        let queue = entries.entry(key.to_string()).or_default();
        evict(queue, now, self.window);

        if queue.len() >= self.max_requests {
            warn!(client = %key, limit = self.max_requests, "Rate limit exceeded");
            return Err(AppError::rate_limited(
                "Too many requests, please try again later",
                self.window,
            ));
        }

        queue.push_back(now);
        let oldest = queue.front().copied().unwrap_or(now);
        Ok(RateLimitStatus {
            limit: self.max_requests,
            remaining: self.max_requests - queue.len(),
            reset_after: (oldest + self.window).saturating_duration_since(now),
        })
    }

    /// Drops addresses with no request inside the window. Returns how many were dropped.
    pub async fn prune(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, queue| {
            evict(queue, now, self.window);
            !queue.is_empty()
        });
        before - entries.len()
    }

    /// Number of tracked addresses.
    pub async fn tracked(&self) -> usize {
        self.entries.lock().await.len()
    }
}

fn evict(queue: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while queue
        .front()
        .is_some_and(|t| now.saturating_duration_since(*t) >= window)
    {
        queue.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use vocalis_core::error::ErrorKind;

    #[tokio::test]
    async fn rejects_beyond_quota_until_oldest_expires() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..3 {
            let status = limiter
                .check_at("10.0.0.1", start + Duration::from_secs(i))
                .await
                .unwrap();
            assert_eq!(status.remaining, 2 - i as usize);
        }

        let err = limiter
            .check_at("10.0.0.1", start + Duration::from_secs(30))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert_eq!(err.retry_after, Some(Duration::from_secs(60)));

        // Just past the window relative to the oldest admitted request.
        let status = limiter
            .check_at("10.0.0.1", start + Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(status.remaining, 0);
        assert_eq!(status.reset_after, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn addresses_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("a", now).await.is_ok());
        assert!(limiter.check_at("a", now).await.is_err());
        assert!(limiter.check_at("b", now).await.is_ok());
    }

    #[tokio::test]
    async fn prune_drops_idle_addresses() {
        let limiter = RateLimiter::new(5, Duration::from_secs(10));
        let start = Instant::now();
        limiter.check_at("old", start).await.unwrap();
        limiter
            .check_at("fresh", start + Duration::from_secs(8))
            .await
            .unwrap();

        assert_eq!(limiter.prune(start + Duration::from_secs(12)).await, 1);
        assert_eq!(limiter.tracked().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_admit_exactly_quota() {
        let limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(300)));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.check("192.0.2.7").await.is_ok()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }
}
