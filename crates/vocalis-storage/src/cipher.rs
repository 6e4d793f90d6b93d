//! Versioned authenticated encryption for byte payloads and files.
//!
//! Wire format: `version (1) || nonce (12) || ciphertext || tag (16)`.
//! The version byte is bound as associated data, so changing it fails
//! authentication like any other modification.

use std::path::{Path, PathBuf};

use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use tracing::{error, info};

use vocalis_core::config::EncryptionConfig;
use vocalis_core::config::encryption::MIN_KDF_ITERATIONS;
use vocalis_core::error::{AppError, ErrorKind};
use vocalis_core::secret::resolve_secret;

use crate::salt::load_or_create_salt;

/// Current payload format version.
pub const FORMAT_VERSION: u8 = 0x01;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Suffix appended to encrypted files.
pub const ENCRYPTED_SUFFIX: &str = ".encrypted";

/// Suffix appended on decryption when the source lacks [`ENCRYPTED_SUFFIX`].
pub const DECRYPTED_SUFFIX: &str = ".decrypted";

/// Encrypts and decrypts artifacts with a derived 256-bit key.
#[derive(Clone)]
pub struct FileCipher {
    cipher: ChaCha20Poly1305,
}

impl std::fmt::Debug for FileCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCipher").finish_non_exhaustive()
    }
}

impl FileCipher {
    /// Builds a cipher from raw key bytes.
    pub fn from_key(key: [u8; KEY_LEN]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        }
    }

    /// Derives the key with PBKDF2-HMAC-SHA256.
    pub fn derive(secret: &str, salt: &[u8], iterations: u32) -> Self {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, iterations, &mut key);
        Self::from_key(key)
    }

    /// Resolves the master secret, loads or creates the salt, and derives the key.
    pub async fn open(config: &EncryptionConfig) -> Result<Self, AppError> {
        if config.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(AppError::configuration(format!(
                "encryption.kdf_iterations must be at least {MIN_KDF_ITERATIONS}"
            )));
        }
        let secret = resolve_secret(config.master_secret.as_deref(), "encryption master secret")?;
        let salt = load_or_create_salt(Path::new(&config.salt_path)).await?;
        let iterations = config.kdf_iterations;

        // PBKDF2 at this cost takes a noticeable amount of CPU.
        let cipher = tokio::task::spawn_blocking(move || Self::derive(&secret, &salt, iterations))
            .await
            .map_err(|e| AppError::internal(format!("Key derivation task failed: {e}")))?;

        info!(iterations, salt_path = %config.salt_path, "File cipher ready");
        Ok(cipher)
    }

    /// Encrypts a payload under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, AppError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: &[FORMAT_VERSION],
                },
            )
            .map_err(|e| AppError::internal(format!("Encryption failure: {e}")))?;

        let mut out = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypts a payload produced by [`Self::encrypt`].
    ///
    /// Any modification or truncation fails with an integrity error.
    pub fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, AppError> {
        if payload.len() < 1 + NONCE_LEN + TAG_LEN {
            return Err(AppError::integrity("Encrypted payload is truncated"));
        }
        let (version, rest) = payload.split_at(1);
        if version[0] != FORMAT_VERSION {
            return Err(AppError::integrity(format!(
                "Unsupported encryption format version {}",
                version[0]
            )));
        }
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &[FORMAT_VERSION],
                },
            )
            .map_err(|_| AppError::integrity("Encrypted payload failed authentication"))
    }

    /// Encrypts `path` into `<path>.encrypted`. The source is left in place.
    pub async fn encrypt_file(&self, path: &Path) -> Result<PathBuf, AppError> {
        let target = append_suffix(path, ENCRYPTED_SUFFIX);
        self.encrypt_file_to(path, &target).await?;
        Ok(target)
    }

    /// Encrypts `source` into `target`.
    pub async fn encrypt_file_to(&self, source: &Path, target: &Path) -> Result<(), AppError> {
        let data = read(source).await?;
        let sealed = self.encrypt(&data)?;
        write(target, &sealed).await?;
        info!(source = %source.display(), target = %target.display(), "File encrypted");
        Ok(())
    }

    /// Decrypts `path`, stripping `.encrypted` or else appending `.decrypted`.
    pub async fn decrypt_file(&self, path: &Path) -> Result<PathBuf, AppError> {
        let target = decrypted_path(path);
        self.decrypt_file_to(path, &target).await?;
        Ok(target)
    }

    /// Decrypts `source` into `target`. Nothing is written when authentication fails.
    pub async fn decrypt_file_to(&self, source: &Path, target: &Path) -> Result<(), AppError> {
        let data = read(source).await?;
        let plain = self.decrypt(&data).inspect_err(|e| {
            error!(source = %source.display(), error = %e, "File decryption failed");
        })?;
        write(target, &plain).await?;
        info!(source = %source.display(), target = %target.display(), "File decrypted");
        Ok(())
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn decrypted_path(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_suffix(ENCRYPTED_SUFFIX)) {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => append_suffix(path, DECRYPTED_SUFFIX),
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, AppError> {
    tokio::fs::read(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read {}", path.display()),
            e,
        )
    })
}

async fn write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    tokio::fs::write(path, data).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write {}", path.display()),
            e,
        )
    })
}
