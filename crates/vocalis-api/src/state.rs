//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use vocalis_auth::{
    BruteForceGuard, IdentityService, JwtDecoder, JwtEncoder, PasswordValidator, RateLimiter,
    RbacEnforcer, SessionCleanup, TokenService,
};
use vocalis_core::config::AppConfig;
use vocalis_core::result::AppResult;
use vocalis_core::secret::resolve_secret;
use vocalis_database::store::{SessionRegistry, UserStore};
use vocalis_storage::FileCipher;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Account lifecycle and authentication
    pub identity: Arc<IdentityService>,
    /// Token issuance and verification
    pub tokens: Arc<TokenService>,
    /// Password complexity policy
    pub password_validator: Arc<PasswordValidator>,
    /// Role-based access control enforcer
    pub rbac: Arc<RbacEnforcer>,
    /// Per-address request quota
    pub rate_limiter: Arc<RateLimiter>,
    /// Per-address failed-authentication blocking
    pub brute_force: Arc<BruteForceGuard>,
    /// Artifact encryption
    pub file_cipher: Arc<FileCipher>,
    sessions: Arc<dyn SessionRegistry>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires every component from configuration and the given stores.
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionRegistry>,
        file_cipher: FileCipher,
    ) -> AppResult<Self> {
        config.validate()?;
        let jwt_secret = resolve_secret(config.auth.jwt_secret.as_deref(), "JWT signing secret")?;

        let identity = IdentityService::from_config(users.clone(), &config.auth)?;
        let tokens = TokenService::new(
            JwtEncoder::from_config(&config.auth, &jwt_secret)?,
            JwtDecoder::new(&jwt_secret),
            sessions.clone(),
            users,
        );

        Ok(Self {
            identity: Arc::new(identity),
            tokens: Arc::new(tokens),
            password_validator: Arc::new(PasswordValidator::new()),
            rbac: Arc::new(RbacEnforcer::new()),
            rate_limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            brute_force: Arc::new(BruteForceGuard::from_config(&config.brute_force)),
            file_cipher: Arc::new(file_cipher),
            config: Arc::new(config),
            sessions,
        })
    }

    /// Builds the periodic cleanup job over this state's components.
    pub fn session_cleanup(&self) -> SessionCleanup {
        SessionCleanup::new(
            self.sessions.clone(),
            self.tokens.as_ref().clone(),
            self.rate_limiter.clone(),
            self.brute_force.clone(),
        )
    }
}
