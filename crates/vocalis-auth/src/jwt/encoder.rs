//! JWT token creation with configurable signing and TTL.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use vocalis_core::config::AuthConfig;
use vocalis_core::error::AppError;
use vocalis_entity::user::User;

use super::claims::{Claims, TokenType};

/// Creates signed HS256 access and refresh tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates an encoder from a resolved signing secret and token lifetimes.
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Creates an encoder using the lifetimes from auth configuration.
    ///
    /// Lifetimes outside the configured bounds are a `Configuration` error.
    pub fn from_config(config: &AuthConfig, secret: &str) -> Result<Self, AppError> {
        config.validate()?;
        let access_ttl = i64::try_from(config.access_ttl_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(|| AppError::configuration("auth.access_ttl_minutes is out of range"))?;
        let refresh_ttl = i64::try_from(config.refresh_ttl_days)
            .ok()
            .and_then(Duration::try_days)
            .ok_or_else(|| AppError::configuration("auth.refresh_ttl_days is out of range"))?;
        Ok(Self::new(secret, access_ttl, refresh_ttl))
    }

    /// Lifetime of access tokens.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Signs a new access token for the user, issued at `now`.
    pub fn encode_access(&self, user: &User, now: DateTime<Utc>) -> Result<(String, Claims), AppError> {
        self.encode_claims(user, TokenType::Access, self.access_ttl, now)
    }

    /// Signs a new refresh token for the user, issued at `now`.
    pub fn encode_refresh(&self, user: &User, now: DateTime<Utc>) -> Result<(String, Claims), AppError> {
        self.encode_claims(user, TokenType::Refresh, self.refresh_ttl, now)
    }

    fn encode_claims(
        &self,
        user: &User,
        token_type: TokenType,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims), AppError> {
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            status: user.status,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok((token, claims))
    }
}
