//! Self-service profile handlers.

use axum::Json;
use axum::extract::State;

use vocalis_auth::Permission;
use vocalis_core::error::AppError;

use crate::dto::request::{ChangePasswordRequest, UpdateProfileRequest};
use crate::dto::response::{MessageResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/auth/me
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    state
        .rbac
        .require_permission(&auth.user, Permission::ManageOwnProfile)?;
    Ok(Json(UserResponse::from(auth.user)))
}

/// PUT /api/auth/me
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    state
        .rbac
        .require_permission(&auth.user, Permission::ManageOwnProfile)?;

    let mut user = auth.user;
    if let Some(first_name) = req.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name;
    }
    if let Some(email) = req.email {
        user.email = email;
    }
    if let Some(settings) = req.settings {
        if !settings.is_object() {
            return Err(AppError::validation("settings must be a JSON object").into());
        }
        user.settings = settings;
    }

    let updated = state.identity.update(user).await?;
    Ok(Json(UserResponse::from(updated)))
}

/// PUT /api/auth/me/password
///
/// Revokes every session of the caller, including the one making the request.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .rbac
        .require_permission(&auth.user, Permission::ManageOwnProfile)?;
    state.password_validator.validate(&req.new_password)?;

    if !state
        .identity
        .verify_password(&auth.user, &req.current_password)
        .await?
    {
        return Err(AppError::bad_request("Current password is incorrect").into());
    }
    state
        .password_validator
        .validate_not_same(&req.current_password, &req.new_password)?;

    state
        .identity
        .change_password(auth.user.id, &req.new_password)
        .await?;
    state.tokens.revoke_all(auth.user.id).await?;

    Ok(Json(MessageResponse::new(
        "Password changed successfully. Please login again.",
    )))
}
