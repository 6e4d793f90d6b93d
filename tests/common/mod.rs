//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use vocalis_api::{AppState, build_app};
use vocalis_auth::NewAccount;
use vocalis_core::config::AppConfig;
use vocalis_database::MemoryStore;
use vocalis_entity::user::{UserRole, UserStatus};
use vocalis_storage::FileCipher;

/// Password that satisfies the complexity policy.
pub const PASSWORD: &str = "Alice#2024";

/// Test application context over an in-memory store.
pub struct TestApp {
    /// The Axum app with the full middleware stack
    pub router: Router,
    /// Shared state, for direct service access
    pub state: AppState,
    /// Backing store
    pub store: MemoryStore,
}

/// Decoded test response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Configuration with cheap hashing and a fixed signing secret.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = Some("integration-test-secret-0123456789abcdef".to_string());
    config.auth.hash_memory_kib = 1024;
    config.auth.hash_iterations = 1;
    config.auth.hash_parallelism = 1;
    config
}

impl TestApp {
    /// Create a new test application with default test configuration
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a test application from explicit configuration
    pub fn with_config(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(
            config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            FileCipher::from_key([7u8; 32]),
        )
        .expect("Failed to build state");
        let router = build_app(state.clone());
        Self {
            router,
            state,
            store,
        }
    }

    /// Make a request from the default client address
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_from("203.0.113.10", method, path, body, token)
            .await
    }

    /// Make a request as if sent from `address`
    pub async fn request_from(
        &self,
        address: &str,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("x-forwarded-for", address);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Create an account directly through the identity service
    pub async fn create_user(&self, username: &str, role: UserRole) -> uuid::Uuid {
        let user = self
            .state
            .identity
            .create(NewAccount {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password: PASSWORD.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                role,
                status: UserStatus::Active,
            })
            .await
            .expect("Failed to create user");
        user.id
    }

    /// Log in and return the access token
    pub async fn login(&self, identifier: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({ "identifier": identifier, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }
}
