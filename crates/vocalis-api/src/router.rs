//! Route definitions for the Vocalis HTTP API.
//!
//! Authentication and account routes are mounted under `/api/auth`;
//! liveness lives at `/api/health` and `/`.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with every route, threading `AppState` through.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(admin_routes())
        .route("/api/health", get(handlers::health::health))
        .route("/", get(handlers::health::health))
        .with_state(state)
}

/// Registration, login, token lifecycle, and self-service profile
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/logout-all", post(handlers::auth::logout_all))
        .route(
            "/api/auth/me",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route("/api/auth/me/password", put(handlers::user::change_password))
}

/// Admin user management
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/auth/admin/users",
            get(handlers::admin::users::list_users).post(handlers::admin::users::create_user),
        )
        .route(
            "/api/auth/admin/users/{id}",
            get(handlers::admin::users::get_user)
                .put(handlers::admin::users::update_user)
                .delete(handlers::admin::users::delete_user),
        )
}
