//! Axum middleware stack.

pub mod brute_force;
pub mod cors;
pub mod rate_limit;
pub mod security_headers;

/// Liveness endpoints; never throttled or blocked.
pub const HEALTH_PATHS: [&str; 2] = ["/", "/api/health"];

/// Prefix of the endpoints whose outcomes feed the brute-force guard.
pub const AUTH_PREFIX: &str = "/api/auth/";

/// Whether `path` is a liveness endpoint.
pub fn is_health_path(path: &str) -> bool {
    HEALTH_PATHS.contains(&path)
}
