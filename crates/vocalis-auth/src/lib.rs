//! # vocalis-auth
//!
//! Authentication, authorization, and abuse control for Vocalis.
//!
//! ## Modules
//!
//! - `password`: Argon2id hashing and the password complexity policy
//! - `identity`: account lifecycle and credential authentication
//! - `jwt`: token claims, signing, and validation
//! - `token`: access/refresh issuance backed by the session registry
//! - `session`: periodic cleanup of expired sessions
//! - `rbac`: role and status permission policies
//! - `throttle`: per-address rate limiting and brute-force blocking

pub mod identity;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod session;
pub mod throttle;
pub mod token;

pub use identity::{IdentityService, NewAccount};
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenType};
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::{Permission, RbacEnforcer};
pub use session::SessionCleanup;
pub use throttle::{BruteForceGuard, RateLimiter};
pub use token::{IssuedToken, TokenService};
