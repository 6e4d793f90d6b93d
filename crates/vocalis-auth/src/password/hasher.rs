//! Argon2id password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use vocalis_core::config::AuthConfig;
use vocalis_core::error::AppError;

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Creates a hasher with explicit cost parameters.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    /// Creates a hasher from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Self::with_params(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored hash.
    ///
    /// A malformed or foreign hash never matches.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        // Cost parameters come from the hash itself.
        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash_password("Correct#Horse1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("Correct#Horse1", &hash));
        assert!(!hasher.verify_password("correct#horse1", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash_password("Same#Pass1").unwrap();
        let b = hasher.hash_password("Same#Pass1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_rejected_without_error() {
        let hasher = hasher();
        assert!(!hasher.verify_password("anything", ""));
        assert!(!hasher.verify_password("anything", "not-a-phc-string"));
        assert!(!hasher.verify_password("anything", "$2b$12$abcdefghijklmnopqrstuv"));
    }

    #[test]
    fn verifies_hash_made_with_other_costs() {
        let strong = PasswordHasher::with_params(2048, 2, 1).unwrap();
        let hash = strong.hash_password("Mixed#Cost9").unwrap();
        assert!(hasher().verify_password("Mixed#Cost9", &hash));
    }

    #[test]
    fn rejects_invalid_params() {
        assert!(PasswordHasher::with_params(1, 0, 0).is_err());
    }
}
