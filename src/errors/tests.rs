use super::*;
use axum::body::to_bytes;
use axum::response::IntoResponse;

/// Helper to extract status code and body JSON from an ApiError response
async fn error_response(error: ApiError) -> (StatusCode, serde_json::Value) {
    let response = error.into_response();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

#[tokio::test]
async fn test_database_error_response() {
    let error = ApiError::Database(anyhow::anyhow!("connection refused"));
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_not_found_response() {
    let error = ApiError::NotFound("Student");
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found");
}

#[tokio::test]
async fn test_unauthorized_response() {
    let msg = "Token has expired".to_string();
    let error = ApiError::Unauthorized(msg.clone());
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], msg);
}

#[tokio::test]
async fn test_forbidden_response() {
    let error = ApiError::Forbidden;
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn test_validation_response() {
    let msg = "Username and password required".to_string();
    let error = ApiError::Validation(msg.clone());
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], msg);
}

#[tokio::test]
async fn test_conflict_response() {
    let msg = "Student with roll number 23B81A0501 already exists".to_string();
    let error = ApiError::Conflict(msg.clone());
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], msg);
}

#[tokio::test]
async fn test_gone_response() {
    let msg = "Delete operations moved to the drive ingestion service".to_string();
    let error = ApiError::Gone(msg.clone());
    let (status, body) = error_response(error).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], msg);
}
