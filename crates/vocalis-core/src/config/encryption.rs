//! Artifact encryption configuration.

use serde::{Deserialize, Serialize};

/// Lowest accepted PBKDF2 iteration count.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Key material for the file cipher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Master encryption secret. Generated when absent.
    #[serde(default)]
    pub master_secret: Option<String>,
    /// Where the key-derivation salt is persisted.
    #[serde(default = "default_salt_path")]
    pub salt_path: String,
    /// PBKDF2 iteration count.
    #[serde(default = "default_iterations")]
    pub kdf_iterations: u32,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            master_secret: None,
            salt_path: default_salt_path(),
            kdf_iterations: default_iterations(),
        }
    }
}

fn default_salt_path() -> String {
    "data/encryption.salt".to_string()
}

fn default_iterations() -> u32 {
    480_000
}
