//! Auth handlers: register, login, refresh, logout.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, warn};

use vocalis_auth::NewAccount;
use vocalis_core::error::AppError;

use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{
    MessageResponse, RefreshResponse, RegisterResponse, TokenResponse, UserResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, BearerToken, ClientInfo, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    state.password_validator.validate(&req.password)?;

    let user = state
        .identity
        .create(NewAccount::registration(
            req.username,
            req.email,
            req.password,
            req.first_name,
            req.last_name,
        ))
        .await?;

    info!(user_id = %user.id, username = %user.username, client = %client.address, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: UserResponse::from(user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .identity
        .authenticate(&req.identifier, &req.password, &client.address)
        .await?
        .ok_or_else(|| {
            warn!(client = %client.address, "Login failed");
            AppError::authentication("Invalid username/email or password")
        })?;

    let access = state
        .tokens
        .issue_access(&user, Some(&client.address), client.user_agent.as_deref())
        .await?;
    let refresh = state.tokens.issue_refresh(&user)?;

    info!(user_id = %user.id, client = %client.address, "User logged in");
    Ok(Json(TokenResponse {
        expires_in: access.expires_in(),
        access_token: access.token,
        refresh_token: refresh.token,
        token_type: "bearer".to_string(),
        user: UserResponse::from(user),
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    BearerToken(token): BearerToken,
) -> Result<Json<RefreshResponse>, ApiError> {
    let issued = state
        .tokens
        .refresh(&token, Some(&client.address), client.user_agent.as_deref())
        .await?;
    Ok(Json(RefreshResponse::from(issued)))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.tokens.revoke(auth.claims.jti).await?;
    info!(user_id = %auth.user.id, "User logged out");
    Ok(Json(MessageResponse::new("Successfully logged out")))
}

/// POST /api/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.tokens.revoke_all(auth.user.id).await?;
    info!(user_id = %auth.user.id, "User logged out of all sessions");
    Ok(Json(MessageResponse::new("Successfully logged out from all sessions")))
}
