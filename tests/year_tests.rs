/// Integration tests for the season analytics endpoint.

mod common;

use axum::http::StatusCode;
use common::*;
use placetrack::models::JsonValue;
use placetrack::repo;

#[tokio::test]
async fn test_list_years_descending_with_breakdown() {
    let (app, state) = create_test_app();
    let token = admin_token(&app).await;

    let student_id = create_student_via_api(&app, &token, "Asha Rao", "23B81A0501").await;

    let current = repo::create_company(&state.pool, "Vertex Systems".to_string(), 2026).unwrap();
    repo::create_company(&state.pool, "Quantlake".to_string(), 2026).unwrap();
    repo::create_company(&state.pool, "Acme".to_string(), 2025).unwrap();
    repo::record_placement(&state.pool, &current.get_id(), &student_id, JsonValue::default())
        .unwrap();

    let (status, body) = send(&app, authed_request("GET", "/api/years", &token)).await;

    assert_eq!(status, StatusCode::OK);
    let seasons = body.as_array().unwrap();
    assert_eq!(seasons.len(), 2);

    // Most recent first
    assert_eq!(seasons[0]["year"], 2026);
    assert_eq!(seasons[1]["year"], 2025);

    assert_eq!(seasons[0]["totalCompanies"], 2);
    assert_eq!(seasons[0]["totalPlaced"], 1);
    assert_eq!(seasons[0]["totalStudentsParticipated"], 1);

    // The per-company breakdown is keyed by companyYearId
    let breakdown = seasons[0]["companyWise"].as_object().unwrap();
    assert_eq!(breakdown.len(), 2);
    let vertex = &breakdown[&current.get_id()];
    assert_eq!(vertex["companyName"], "Vertex Systems");
    assert_eq!(vertex["placed"], 1);
    assert_eq!(vertex["status"], "running");

    assert_eq!(seasons[1]["totalCompanies"], 1);
    assert_eq!(seasons[1]["totalPlaced"], 0);
}

#[tokio::test]
async fn test_years_empty() {
    let (app, _state) = create_test_app();
    let token = admin_token(&app).await;

    let (status, body) = send(&app, authed_request("GET", "/api/years", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_years_require_admin() {
    let (app, _state) = create_test_app();

    let (status, _) = send(
        &app,
        axum::http::Request::builder()
            .uri("/api/years")
            .method("GET")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
