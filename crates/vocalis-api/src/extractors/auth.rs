//! Bearer-token extractors.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use vocalis_auth::jwt::Claims;
use vocalis_core::error::AppError;
use vocalis_entity::user::User;

use crate::error::ApiError;
use crate::state::AppState;

/// The raw token from `Authorization: Bearer <token>`, unverified.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        Ok(Self(token.to_string()))
    }
}

/// An authenticated, active user behind a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Current state of the account.
    pub user: User,
    /// Claims of the presented access token.
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.tokens.verify_access(&token).await?;

        // Role and status come from the store, not the token.
        let user = state
            .identity
            .get_by_id(claims.user_id())
            .await?
            .ok_or_else(|| AppError::authentication("User not found"))?;
        if !user.status.can_use_tokens() {
            return Err(AppError::authorization(format!("Account is {}", user.status)).into());
        }

        Ok(Self { user, claims })
    }
}
