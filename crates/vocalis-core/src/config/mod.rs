//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `VOCALIS__`-prefixed environment variables. Each
//! sub-module represents a logical configuration section.

pub mod app;
pub mod auth;
pub mod database;
pub mod encryption;
pub mod logging;
pub mod throttle;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::auth::{AuthConfig, BootstrapConfig};
pub use self::database::DatabaseConfig;
pub use self::encryption::EncryptionConfig;
pub use self::logging::LoggingConfig;
pub use self::throttle::{BruteForceConfig, RateLimitConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// configuration (default.toml + environment overlay + env vars).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Sliding-window rate limit settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Brute-force guard settings.
    #[serde(default)]
    pub brute_force: BruteForceConfig,
    /// File cipher settings.
    #[serde(default)]
    pub encryption: EncryptionConfig,
    /// Default administrator provisioning.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `VOCALIS__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("VOCALIS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would silently weaken the service.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.encryption.kdf_iterations < encryption::MIN_KDF_ITERATIONS {
            return Err(AppError::configuration(format!(
                "encryption.kdf_iterations must be at least {}",
                encryption::MIN_KDF_ITERATIONS
            )));
        }
        self.auth.validate()?;
        self.rate_limit.validate()?;
        self.brute_force.validate()?;
        Ok(())
    }
}
