//! Integration tests for role-gated user administration.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use vocalis_entity::user::UserRole;

use common::{PASSWORD, TestApp};

#[tokio::test]
async fn test_regular_user_is_forbidden() {
    let app = TestApp::new();
    app.create_user("bob", UserRole::User).await;
    let token = app.login("bob", PASSWORD).await;

    let response = app
        .request("GET", "/api/auth/admin/users", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_moderator_can_view_but_not_modify() {
    let app = TestApp::new();
    let bob = app.create_user("bob", UserRole::User).await;
    app.create_user("mod", UserRole::Moderator).await;
    let token = app.login("mod", PASSWORD).await;

    let response = app
        .request("GET", &format!("/api/auth/admin/users/{bob}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "bob");

    let response = app
        .request("GET", "/api/auth/admin/users", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "DELETE",
            &format!("/api/auth/admin/users/{bob}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_lists_and_updates_users() {
    let app = TestApp::new();
    app.create_user("root", UserRole::Admin).await;
    let token = app.login("root", PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/api/auth/admin/users",
            Some(json!({
                "username": "carol",
                "email": "carol@example.com",
                "password": "Carol#Pass1",
                "role": "moderator",
                "first_name": "Carol",
                "last_name": "Smith",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["role"], "moderator");
    assert_eq!(response.body["status"], "active");
    let carol = response.body["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "GET",
            "/api/auth/admin/users?role=moderator",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let users = response.body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "carol");

    let response = app
        .request(
            "PUT",
            &format!("/api/auth/admin/users/{carol}"),
            Some(json!({ "status": "suspended" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "suspended");
    assert_eq!(response.body["role"], "moderator");

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "identifier": "carol", "password": "Carol#Pass1" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_suspended_account_tokens_are_forbidden() {
    let app = TestApp::new();
    app.create_user("root", UserRole::Admin).await;
    let bob = app.create_user("bob", UserRole::User).await;
    let admin_token = app.login("root", PASSWORD).await;
    let bob_token = app.login("bob", PASSWORD).await;

    let response = app
        .request(
            "PUT",
            &format!("/api/auth/admin/users/{bob}"),
            Some(json!({ "status": "suspended" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", "/api/auth/me", None, Some(&bob_token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_create_rejects_duplicates_and_weak_passwords() {
    let app = TestApp::new();
    app.create_user("root", UserRole::Admin).await;
    let token = app.login("root", PASSWORD).await;

    let body = json!({
        "username": "root",
        "email": "other@example.com",
        "password": "Strong#Pass1",
        "role": "user",
        "first_name": "Dup",
        "last_name": "User",
    });
    let response = app
        .request("POST", "/api/auth/admin/users", Some(body), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let body = json!({
        "username": "weak",
        "email": "weak@example.com",
        "password": "weakpass",
        "role": "user",
        "first_name": "Weak",
        "last_name": "User",
    });
    let response = app
        .request("POST", "/api/auth/admin/users", Some(body), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_admin_delete_rules() {
    let app = TestApp::new();
    let root = app.create_user("root", UserRole::Admin).await;
    let bob = app.create_user("bob", UserRole::User).await;
    let token = app.login("root", PASSWORD).await;
    let bob_token = app.login("bob", PASSWORD).await;

    let response = app
        .request(
            "DELETE",
            &format!("/api/auth/admin/users/{root}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "DELETE",
            &format!("/api/auth/admin/users/{}", Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "DELETE",
            &format!("/api/auth/admin/users/{bob}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Sessions are removed with the account.
    assert_eq!(app.store.session_count().await, 1);
    let response = app
        .request("GET", "/api/auth/me", None, Some(&bob_token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", &format!("/api/auth/admin/users/{bob}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
