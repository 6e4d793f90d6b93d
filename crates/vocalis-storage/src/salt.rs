//! Persistent key-derivation salt.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use rand::RngCore;
use rand::rngs::OsRng;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use vocalis_core::error::{AppError, ErrorKind};

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Loads the salt at `path`, creating it on first use.
///
/// An existing salt is never regenerated. A file of the wrong length is an
/// error. Concurrent first starts agree on a single salt: the file appears
/// atomically, complete and owner-only, and losers of the race read the
/// winner's salt.
pub async fn load_or_create_salt(path: &Path) -> Result<[u8; SALT_LEN], AppError> {
    match read_salt(path).await? {
        Some(salt) => Ok(salt),
        None => create_salt(path).await,
    }
}

async fn read_salt(path: &Path) -> Result<Option<[u8; SALT_LEN]>, AppError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read salt file {}", path.display()),
                e,
            ));
        }
    };
    let salt: [u8; SALT_LEN] = bytes.as_slice().try_into().map_err(|_| {
        AppError::configuration(format!(
            "Salt file {} holds {} bytes, expected {SALT_LEN}",
            path.display(),
            bytes.len()
        ))
    })?;
    Ok(Some(salt))
}

async fn create_salt(path: &Path) -> Result<[u8; SALT_LEN], AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    // Written in full under a private name, then linked into place; the
    // link fails if another process already published a salt.
    let staging = staging_path(path);
    write_owner_only(&staging, &salt).await?;
    let published = tokio::fs::hard_link(&staging, path).await;
    if let Err(e) = tokio::fs::remove_file(&staging).await {
        warn!(path = %staging.display(), error = %e, "Failed to remove staging salt file");
    }

    match published {
        Ok(()) => {
            warn!(path = %path.display(), "Created new encryption salt; back it up with the master secret");
            info!(path = %path.display(), "Encryption salt persisted");
            Ok(salt)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            info!(path = %path.display(), "Encryption salt created concurrently; using it");
            read_salt(path).await?.ok_or_else(|| {
                AppError::storage(format!("Salt file {} vanished", path.display()))
            })
        }
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to persist salt file {}", path.display()),
            e,
        )),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut suffix = [0u8; 8];
    OsRng.fill_bytes(&mut suffix);
    let suffix: String = suffix.iter().map(|b| format!("{b:02x}")).collect();

    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(".{suffix}.tmp"));
    path.with_file_name(name)
}

async fn write_owner_only(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn salt_is_created_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("encryption.salt");

        let first = load_or_create_salt(&path).await.unwrap();
        let second = load_or_create_salt(&path).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&path).unwrap(), first.to_vec());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn salt_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encryption.salt");
        load_or_create_salt(&path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_agrees_on_one_salt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encryption.salt");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let path = path.clone();
            handles.push(tokio::spawn(async move { load_or_create_salt(&path).await }));
        }
        let mut salts = Vec::new();
        for handle in handles {
            salts.push(handle.await.unwrap().unwrap());
        }

        assert!(salts.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(std::fs::read(&path).unwrap(), salts[0].to_vec());
        // Staging files are cleaned up.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn truncated_salt_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encryption.salt");
        std::fs::write(&path, [7u8; 10]).unwrap();

        let err = load_or_create_salt(&path).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        // Left untouched.
        assert_eq!(std::fs::read(&path).unwrap(), vec![7u8; 10]);
    }
}
