//! Sliding-window rate limiter middleware.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::extractors::client_address;
use crate::state::AppState;

/// Counts every non-exempt request against the client's quota.
///
/// Admitted responses carry `X-RateLimit-*` headers; rejected requests get
/// `429` with `Retry-After` and never reach the handler.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let config = &state.config.rate_limit;
    let path = request.uri().path();
    if !config.enabled || config.exempt_paths.iter().any(|p| p == path) {
        return next.run(request).await;
    }

    let client = client_address(request.headers(), request.extensions());
    let status = match state.rate_limiter.check(&client).await {
        Ok(status) => status,
        Err(err) => return ApiError(err).into_response(),
    };

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(status.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(status.remaining));
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from(status.reset_after.as_secs()),
    );
    response
}
