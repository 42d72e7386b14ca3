/// Integration tests for the auth endpoints: login, refresh, logout,
/// change-password and session introspection.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::json;

/// Extracts the `name=value` pair of a Set-Cookie header
fn cookie_pair(cookies: &[String], name: &str) -> Option<String> {
    cookies
        .iter()
        .find(|cookie| cookie.starts_with(&format!("{name}=")))
        .map(|cookie| cookie.split(';').next().unwrap().to_string())
}

#[tokio::test]
async fn test_login_success_sets_cookies() {
    let (app, _state) = create_test_app();

    let body = json!({"username": "admin", "password": "admin"});
    let (status, json, cookies) =
        send_with_cookies(&app, json_request("POST", "/api/auth/login", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Login successful");
    assert_eq!(json["user"]["username"], "admin");
    assert_eq!(json["user"]["role"], "admin");
    assert!(json["accessToken"].is_string());
    assert!(json["refreshToken"].is_string());
    // The password hash never leaves the server
    assert!(json["user"].get("password").is_none());

    let access = cookie_pair(&cookies, "accessToken").expect("access cookie");
    let refresh = cookie_pair(&cookies, "refreshToken").expect("refresh cookie");
    assert!(access.len() > "accessToken=".len());
    assert!(refresh.len() > "refreshToken=".len());

    let raw_access = cookies
        .iter()
        .find(|c| c.starts_with("accessToken="))
        .unwrap();
    assert!(raw_access.contains("HttpOnly"));
    assert!(raw_access.contains("SameSite=None"));
    assert!(raw_access.contains("Secure"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _state) = create_test_app();

    let (status, body) = login(&app, "admin", "wrong").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let (app, _state) = create_test_app();

    let (status, body) = login(&app, "ghost", "whatever").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_me_with_bearer_token() {
    let (app, _state) = create_test_app();
    let token = admin_token(&app).await;

    let (status, body) = send(&app, authed_request("GET", "/api/auth/me", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn test_me_with_cookie() {
    let (app, _state) = create_test_app();

    let login_body = json!({"username": "admin", "password": "admin"});
    let (_, _, cookies) =
        send_with_cookies(&app, json_request("POST", "/api/auth/login", &login_body)).await;
    let access = cookie_pair(&cookies, "accessToken").unwrap();

    let request = Request::builder()
        .uri("/api/auth/me")
        .method("GET")
        .header("Cookie", access)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
}

#[tokio::test]
async fn test_me_without_token() {
    let (app, _state) = create_test_app();

    let request = Request::builder()
        .uri("/api/auth/me")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is missing");
}

#[tokio::test]
async fn test_me_with_garbage_token() {
    let (app, _state) = create_test_app();

    let (status, body) = send(&app, authed_request("GET", "/api/auth/me", "garbage")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_refresh_flow() {
    let (app, _state) = create_test_app();

    let login_body = json!({"username": "admin", "password": "admin"});
    let (_, _, cookies) =
        send_with_cookies(&app, json_request("POST", "/api/auth/login", &login_body)).await;
    let refresh = cookie_pair(&cookies, "refreshToken").unwrap();

    let request = Request::builder()
        .uri("/api/auth/refresh")
        .method("POST")
        .header("Cookie", refresh)
        .body(Body::empty())
        .unwrap();
    let (status, body, new_cookies) = send_with_cookies(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token refreshed");
    let new_access = body["accessToken"].as_str().unwrap();
    assert!(cookie_pair(&new_cookies, "accessToken").is_some());

    // The fresh access token works
    let (status, me) = send(&app, authed_request("GET", "/api/auth/me", new_access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let (app, _state) = create_test_app();

    let request = Request::builder()
        .uri("/api/auth/refresh")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Refresh token missing");
}

#[tokio::test]
async fn test_refresh_with_garbage_cookie() {
    let (app, _state) = create_test_app();

    let request = Request::builder()
        .uri("/api/auth/refresh")
        .method("POST")
        .header("Cookie", "refreshToken=garbage")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid refresh token");
}

#[tokio::test]
async fn test_stale_refresh_token_rejected_after_relogin() {
    let (app, _state) = create_test_app();

    let login_body = json!({"username": "admin", "password": "admin"});
    let (_, _, first_cookies) =
        send_with_cookies(&app, json_request("POST", "/api/auth/login", &login_body)).await;
    let stale = cookie_pair(&first_cookies, "refreshToken").unwrap();

    // A second login rotates the persisted refresh token
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let (status, _, _) =
        send_with_cookies(&app, json_request("POST", "/api/auth/login", &login_body)).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri("/api/auth/refresh")
        .method("POST")
        .header("Cookie", stale)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid refresh token");
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let (app, _state) = create_test_app();

    let request = Request::builder()
        .uri("/api/auth/logout")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let (status, body, cookies) = send_with_cookies(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let access = cookies
        .iter()
        .find(|c| c.starts_with("accessToken="))
        .expect("access removal cookie");
    assert!(access.contains("Max-Age=0"));
    let refresh = cookies
        .iter()
        .find(|c| c.starts_with("refreshToken="))
        .expect("refresh removal cookie");
    assert!(refresh.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_change_password_validations() {
    let (app, _state) = create_test_app();
    let token = admin_token(&app).await;

    // Missing fields
    let (status, body) = send(
        &app,
        authed_json_request(
            "POST",
            "/api/auth/change-password",
            &token,
            &json!({"currentPassword": "admin"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password and new password required");

    // Too short
    let (status, body) = send(
        &app,
        authed_json_request(
            "POST",
            "/api/auth/change-password",
            &token,
            &json!({"currentPassword": "admin", "newPassword": "abc"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "New password must be at least 6 characters");

    // Wrong current password
    let (status, body) = send(
        &app,
        authed_json_request(
            "POST",
            "/api/auth/change-password",
            &token,
            &json!({"currentPassword": "nope", "newPassword": "longenough"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Current password is incorrect");
}

#[tokio::test]
async fn test_change_password_success() {
    let (app, _state) = create_test_app();
    let token = admin_token(&app).await;

    let (status, body) = send(
        &app,
        authed_json_request(
            "POST",
            "/api/auth/change-password",
            &token,
            &json!({"currentPassword": "admin", "newPassword": "s3cret-enough"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully");

    // The old password no longer works, the new one does
    let (status, _) = login(&app, "admin", "admin").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "admin", "s3cret-enough").await;
    assert_eq!(status, StatusCode::OK);
}
