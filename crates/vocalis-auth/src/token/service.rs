//! Token issuance, verification, refresh, and revocation.
//!
//! Access tokens are backed by a session row keyed by their `jti`, so every
//! verification consults the session registry and revocation takes effect
//! immediately. Refresh tokens are validated by signature, expiry, and type
//! only; they stop working for a user only when the user disappears or
//! becomes inactive.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use vocalis_core::error::AppError;
use vocalis_core::result::AppResult;
use vocalis_database::store::{SessionRegistry, UserStore};
use vocalis_entity::session::NewSession;
use vocalis_entity::user::User;

use crate::jwt::{Claims, JwtDecoder, JwtEncoder, TokenType};

/// A signed token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The encoded JWT.
    pub token: String,
    /// The claims it carries.
    pub claims: Claims,
}

impl IssuedToken {
    /// Seconds from issuance until expiry.
    pub fn expires_in(&self) -> i64 {
        self.claims.lifetime_seconds()
    }
}

/// Issues and validates JWTs against the session registry.
#[derive(Clone)]
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    sessions: Arc<dyn SessionRegistry>,
    users: Arc<dyn UserStore>,
    /// Serializes session-row mutations per user.
    user_locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("encoder", &self.encoder)
            .finish()
    }
}

impl TokenService {
    /// Creates a new token service.
    pub fn new(
        encoder: JwtEncoder,
        decoder: JwtDecoder,
        sessions: Arc<dyn SessionRegistry>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            encoder,
            decoder,
            sessions,
            users,
            user_locks: Arc::new(DashMap::new()),
        }
    }

    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.user_locks.entry(user_id).or_default().clone()
    }

    /// Drops per-user locks nobody is holding. Returns how many were dropped.
    pub fn prune_idle_locks(&self) -> usize {
        let before = self.user_locks.len();
        self.user_locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - self.user_locks.len()
    }

    /// Issues an access token and records its session.
    pub async fn issue_access(
        &self,
        user: &User,
        source_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> AppResult<IssuedToken> {
        self.issue_access_at(user, source_address, user_agent, Utc::now())
            .await
    }

    /// [`Self::issue_access`] with an explicit issuance instant.
    pub async fn issue_access_at(
        &self,
        user: &User,
        source_address: Option<&str>,
        user_agent: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<IssuedToken> {
        let (token, claims) = self.encoder.encode_access(user, now)?;

        let lock = self.user_lock(user.id);
        let _guard = lock.lock().await;
        self.sessions
            .create(NewSession {
                user_id: user.id,
                token_id: claims.jti,
                expires_at: claims.expires_at(),
                source_address: source_address.map(str::to_string),
                client_agent: user_agent.map(str::to_string),
            })
            .await?;

        info!(user_id = %user.id, token_id = %claims.jti, "Access token issued");
        Ok(IssuedToken { token, claims })
    }

    /// Issues a refresh token. No session row is written.
    pub fn issue_refresh(&self, user: &User) -> AppResult<IssuedToken> {
        self.issue_refresh_at(user, Utc::now())
    }

    /// [`Self::issue_refresh`] with an explicit issuance instant.
    pub fn issue_refresh_at(&self, user: &User, now: DateTime<Utc>) -> AppResult<IssuedToken> {
        let (token, claims) = self.encoder.encode_refresh(user, now)?;
        Ok(IssuedToken { token, claims })
    }

    /// Verifies a token of either type.
    ///
    /// Access tokens additionally require an active, unexpired session owned
    /// by the token's subject; otherwise `TokenRevoked` is returned.
    pub async fn verify(&self, token: &str) -> AppResult<Claims> {
        let claims = self.decoder.decode(token)?;
        if claims.token_type == TokenType::Access {
            let session = self.sessions.find_by_token_id(claims.jti).await?;
            let valid = session
                .is_some_and(|s| s.user_id == claims.sub && s.is_valid_at(Utc::now()));
            if !valid {
                return Err(AppError::token_revoked("Token has been revoked"));
            }
        }
        Ok(claims)
    }

    /// Verifies a token and requires it to be an access token.
    pub async fn verify_access(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify(token).await?;
        if claims.token_type != TokenType::Access {
            return Err(AppError::token_invalid(
                "Invalid token type: expected access token",
            ));
        }
        Ok(claims)
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// The refresh token itself is neither rotated nor invalidated.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        source_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> AppResult<IssuedToken> {
        let claims = self.verify(refresh_token).await?;
        if claims.token_type != TokenType::Refresh {
            return Err(AppError::token_invalid(
                "Invalid token type: expected refresh token",
            ));
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if !user.status.can_use_tokens() {
            warn!(user_id = %user.id, status = %user.status, "Refresh attempted for inactive account");
            return Err(AppError::authentication("Account is not active"));
        }

        self.issue_access(&user, source_address, user_agent).await
    }

    /// Revokes one access token's session. Idempotent.
    pub async fn revoke(&self, token_id: Uuid) -> AppResult<bool> {
        let revoked = self.sessions.deactivate(token_id).await?;
        if revoked {
            info!(token_id = %token_id, "Session revoked");
        }
        Ok(revoked)
    }

    /// Revokes every session of a user. Idempotent.
    pub async fn revoke_all(&self, user_id: Uuid) -> AppResult<bool> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        let count = self.sessions.deactivate_all_for_user(user_id).await?;
        info!(user_id = %user_id, count, "All sessions revoked");
        Ok(count > 0)
    }
}
