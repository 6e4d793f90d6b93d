//! Admin user management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::info;
use uuid::Uuid;

use vocalis_auth::{NewAccount, Permission};
use vocalis_core::error::AppError;
use vocalis_entity::user::{UserFilter, UserStatus};

use crate::dto::request::{AdminCreateUserRequest, AdminUpdateUserRequest, ListUsersQuery};
use crate::dto::response::{MessageResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/auth/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    state
        .rbac
        .require_permission(&auth.user, Permission::ListUsers)?;

    let filter = UserFilter {
        role: query.role,
        status: query.status,
    };
    let users = state
        .identity
        .list(filter, query.limit, query.offset)
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/auth/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<AdminCreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    state
        .rbac
        .require_permission(&auth.user, Permission::CreateUser)?;
    state.password_validator.validate(&req.password)?;

    let user = state
        .identity
        .create(NewAccount {
            username: req.username,
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role,
            status: req.status.unwrap_or(UserStatus::Active),
        })
        .await?;

    info!(admin_id = %auth.user.id, user_id = %user.id, role = %user.role, "User created by admin");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /api/auth/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    state
        .rbac
        .require_permission(&auth.user, Permission::ViewUser)?;

    let user = state
        .identity
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/auth/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    state
        .rbac
        .require_permission(&auth.user, Permission::UpdateUser)?;

    let mut user = state
        .identity
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if let Some(username) = req.username {
        user.username = username;
    }
    if let Some(email) = req.email {
        user.email = email;
    }
    if let Some(role) = req.role {
        user.role = role;
    }
    if let Some(status) = req.status {
        user.status = status;
    }
    if let Some(first_name) = req.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name;
    }

    let updated = state.identity.update(user).await?;
    info!(admin_id = %auth.user.id, user_id = %updated.id, "User updated by admin");
    Ok(Json(UserResponse::from(updated)))
}

/// DELETE /api/auth/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .rbac
        .require_permission(&auth.user, Permission::DeleteUser)?;

    if id == auth.user.id {
        return Err(AppError::bad_request("Cannot delete your own account").into());
    }
    if !state.identity.delete(id).await? {
        return Err(AppError::not_found("User not found").into());
    }

    info!(admin_id = %auth.user.id, user_id = %id, "User deleted by admin");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
