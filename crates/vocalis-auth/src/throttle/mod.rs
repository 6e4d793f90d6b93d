//! Per-address request throttling.
//!
//! Both components keep their state in-process behind a `tokio` mutex, so
//! their guarantees hold per process only.

pub mod brute_force;
pub mod rate_limit;

pub use brute_force::BruteForceGuard;
pub use rate_limit::{RateLimitStatus, RateLimiter};
