//! Application builder: wires router, middleware, and state into an Axum app.

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::middleware;
use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
///
/// Requests pass the rate limiter first, then the brute-force guard.
pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.request_body_limit_bytes;
    let cors = build_cors_layer(&state.config.server);

    build_router(state.clone())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::brute_force::brute_force,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::rate_limit::rate_limit,
        ))
        .layer(axum_middleware::from_fn(
            middleware::security_headers::security_headers,
        ))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
