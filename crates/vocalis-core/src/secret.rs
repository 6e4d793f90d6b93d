//! Master secret resolution.
//!
//! Signing and encryption secrets must be supplied externally in
//! production. When one is missing an ephemeral random secret is generated
//! so the process can still start, and a warning is emitted because
//! anything produced with it will not survive a restart.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use crate::error::AppError;

/// Minimum accepted length, in characters, of a configured secret.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Number of random bytes behind a generated secret.
const GENERATED_SECRET_BYTES: usize = 32;

/// Resolve a configured secret, generating an ephemeral one when absent.
///
/// `name` identifies the secret in log output and error messages.
pub fn resolve_secret(configured: Option<&str>, name: &str) -> Result<String, AppError> {
    match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(secret) if secret.chars().count() < MIN_SECRET_LENGTH => {
            Err(AppError::configuration(format!(
                "{name} must be at least {MIN_SECRET_LENGTH} characters long"
            )))
        }
        Some(secret) => Ok(secret.to_string()),
        None => {
            warn!(
                secret = name,
                "No {name} configured; generated an ephemeral random secret. \
                 Everything derived from it is lost on restart. \
                 Configure it explicitly in production!"
            );
            Ok(generate_secret())
        }
    }
}

/// Generate a URL-safe random secret.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; GENERATED_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn accepts_long_secret() {
        let secret = "a".repeat(MIN_SECRET_LENGTH);
        assert_eq!(resolve_secret(Some(&secret), "jwt_secret").unwrap(), secret);
    }

    #[test]
    fn rejects_short_secret() {
        let err = resolve_secret(Some("too-short"), "jwt_secret").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("jwt_secret"));
    }

    #[test]
    fn generates_when_missing() {
        let a = resolve_secret(None, "master_secret").unwrap();
        let b = resolve_secret(Some("   "), "master_secret").unwrap();
        assert!(a.len() >= MIN_SECRET_LENGTH);
        assert!(b.len() >= MIN_SECRET_LENGTH);
        assert_ne!(a, b);
    }
}
