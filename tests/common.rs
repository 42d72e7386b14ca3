//! Common test utilities for placetrack integration tests
//!
//! This file contains shared functions for all integration tests: test
//! application setup against an in-memory database, login helpers, and
//! request builders for authenticated calls.

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use placetrack::{AppState, config, create_app, db, repo, run_migrations};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Creates a connection pool against a fresh in-memory database
///
/// Uses a unique shared-cache URI so every connection in the pool sees the
/// same database while tests stay isolated from each other.
pub fn test_pool() -> Arc<db::DbPool> {
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:itest_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url);

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn);

    Arc::new(pool)
}

/// Creates a test application with an in-memory database
///
/// The default admin account (`admin`/`admin`) is seeded, matching what a
/// fresh deployment looks like.
///
/// ### Returns
///
/// The Axum Router plus the state behind it, so tests can seed data
/// through the repository layer directly.
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let pool = test_pool();

    let mut config = config::base_config(None);
    config.jwt_secret = "itest-access-secret".to_string();
    config.jwt_refresh_secret = "itest-refresh-secret".to_string();

    let state = AppState::from_config(pool, &config);
    repo::ensure_default_admin(&state.pool).expect("Failed to seed admin");

    (create_app(state.clone()), state)
}

/// Sends a request and returns the status plus the parsed JSON body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Sends a request and returns status, JSON body, and Set-Cookie headers
pub async fn send_with_cookies(
    app: &Router,
    request: Request<Body>,
) -> (StatusCode, Value, Vec<String>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json, cookies)
}

/// Builds a JSON request
pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// Builds a bodyless request carrying a Bearer token
pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// Builds a JSON request carrying a Bearer token
pub fn authed_json_request(method: &str, uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// Logs in via the API and returns the response body
pub async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    let body = serde_json::json!({"username": username, "password": password});
    send(app, json_request("POST", "/api/auth/login", &body)).await
}

/// Logs in as the seeded admin and returns an access token
pub async fn admin_token(app: &Router) -> String {
    let (status, body) = login(app, "admin", "admin").await;
    assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
    body["accessToken"].as_str().unwrap().to_string()
}

/// Creates a student via the API and returns its ID
pub async fn create_student_via_api(app: &Router, token: &str, name: &str, roll: &str) -> String {
    let body = serde_json::json!({
        "name": name,
        "rollNumber": roll,
        "email": format!("{roll}@example.edu"),
    });
    let (status, json) = send(
        app,
        authed_json_request("POST", "/api/students", token, &body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create student failed: {json}");
    json["student"]["studentId"].as_str().unwrap().to_string()
}
