//! Per-address brute-force blocking middleware.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::extractors::client_address;
use crate::middleware::{AUTH_PREFIX, is_health_path};
use crate::state::AppState;

/// Rejects blocked addresses and feeds auth-endpoint outcomes to the guard.
///
/// A `401` from an auth endpoint counts as a failure; a success clears the
/// address's failure history.
pub async fn brute_force(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !state.config.brute_force.enabled || is_health_path(&path) {
        return next.run(request).await;
    }

    let client = client_address(request.headers(), request.extensions());
    if let Err(err) = state.brute_force.check(&client).await {
        return ApiError(err).into_response();
    }

    let response = next.run(request).await;

    if path.starts_with(AUTH_PREFIX) {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            state.brute_force.record_failure(&client).await;
        } else if status.is_success() {
            state.brute_force.record_success(&client).await;
        }
    }
    response
}
