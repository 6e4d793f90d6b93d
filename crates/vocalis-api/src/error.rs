//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use vocalis_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Seconds to wait before retrying, for throttling errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// An [`AppError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Status code and stable error code for an error kind.
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::Validation => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
        ErrorKind::BadRequest => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED"),
        ErrorKind::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
        ErrorKind::TokenInvalid => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
        ErrorKind::TokenRevoked => (StatusCode::UNAUTHORIZED, "TOKEN_REVOKED"),
        ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        ErrorKind::TemporarilyBlocked => (StatusCode::TOO_MANY_REQUESTS, "TEMPORARILY_BLOCKED"),
        ErrorKind::Integrity => (StatusCode::INTERNAL_SERVER_ERROR, "INTEGRITY_ERROR"),
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Storage
        | ErrorKind::Configuration
        | ErrorKind::Serialization => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = status_for(err.kind);

        let message = if err.kind.is_internal() {
            tracing::error!(
                kind = %err.kind,
                error = %err.message,
                source = ?err.source,
                "Internal server error"
            );
            "An internal error occurred".to_string()
        } else {
            err.message
        };

        // Round up so clients never retry early.
        let retry_after = err
            .retry_after
            .map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0));

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
            retry_after,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn internal_details_are_hidden() {
        let response = ApiError(AppError::database("relation \"users\" does not exist")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
        assert!(body.get("retry_after").is_none());
    }

    #[tokio::test]
    async fn throttling_carries_retry_after() {
        let response = ApiError(AppError::temporarily_blocked(
            "blocked",
            Duration::from_millis(899_200),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "900");

        let body = body_json(response).await;
        assert_eq!(body["error"], "TEMPORARILY_BLOCKED");
        assert_eq!(body["retry_after"], 900);
    }

    #[test]
    fn token_errors_are_unauthorized() {
        for kind in [
            ErrorKind::Authentication,
            ErrorKind::TokenExpired,
            ErrorKind::TokenInvalid,
            ErrorKind::TokenRevoked,
        ] {
            assert_eq!(status_for(kind).0, StatusCode::UNAUTHORIZED);
        }
        assert_eq!(status_for(ErrorKind::Validation).0, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
