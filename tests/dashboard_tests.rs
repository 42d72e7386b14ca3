/// Integration tests for the dashboard summary and stats initialization.

mod common;

use axum::http::StatusCode;
use common::*;
use placetrack::models::{DriveStatus, JsonValue};
use placetrack::repo;

#[tokio::test]
async fn test_initialize_stats() {
    let (app, state) = create_test_app();
    let token = admin_token(&app).await;

    let student_id = create_student_via_api(&app, &token, "Asha Rao", "23B81A0501").await;
    create_student_via_api(&app, &token, "Bilal Khan", "23B81A0502").await;

    let company = repo::create_company(&state.pool, "Vertex Systems".to_string(), 2026).unwrap();
    repo::create_company(&state.pool, "Acme".to_string(), 2025).unwrap();
    repo::record_placement(&state.pool, &company.get_id(), &student_id, JsonValue::default())
        .unwrap();
    repo::update_company_status(&state.pool, &company.get_id(), DriveStatus::Completed).unwrap();

    let (status, body) = send(
        &app,
        authed_request("POST", "/api/admin/initialize-stats", &token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "System stats initialized");
    assert_eq!(body["stats"]["totalYears"], 2);
    assert_eq!(body["stats"]["totalCompanies"], 2);
    assert_eq!(body["stats"]["completedCompanies"], 1);
    assert_eq!(body["stats"]["runningCompanies"], 1);
    assert_eq!(body["stats"]["totalStudents"], 2);
    assert_eq!(body["stats"]["totalPlaced"], 1);
    assert_eq!(body["stats"]["totalNotPlaced"], 1);
    assert_eq!(body["stats"]["totalOffers"], 1);
}

#[tokio::test]
async fn test_dashboard_summary() {
    let (app, state) = create_test_app();
    let token = admin_token(&app).await;

    let student_id = create_student_via_api(&app, &token, "Asha Rao", "23B81A0501").await;

    repo::create_company(&state.pool, "Acme".to_string(), 2025).unwrap();
    let current = repo::create_company(&state.pool, "Vertex Systems".to_string(), 2026).unwrap();
    repo::record_placement(&state.pool, &current.get_id(), &student_id, JsonValue::default())
        .unwrap();

    // Anchor the pre-aggregated row, then read the dashboard
    send(&app, authed_request("POST", "/api/admin/initialize-stats", &token)).await;

    let (status, body) = send(
        &app,
        authed_request("GET", "/api/summary/dashboard", &token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["counts"]["years"], 2);
    assert_eq!(body["counts"]["companies"], 2);
    assert_eq!(body["counts"]["students"], 1);

    assert_eq!(body["stats"]["totalCompanies"], 2);
    assert_eq!(body["stats"]["runningCompanies"], 2);
    assert_eq!(body["stats"]["completedCompanies"], 0);
    assert_eq!(body["stats"]["totalPlaced"], 1);

    // The latest season wins, with its breakdown derived from the drives
    assert_eq!(body["latestYear"]["year"], 2026);
    assert_eq!(body["latestYear"]["totalCompanies"], 1);
    assert_eq!(body["latestYear"]["totalPlaced"], 1);
    let breakdown = body["latestYear"]["companyWise"].as_object().unwrap();
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[&current.get_id()]["companyName"], "Vertex Systems");

    // Five most recently updated drives at most
    let recent = body["recentCompanies"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent[0]["companyYearId"].is_string());
}

#[tokio::test]
async fn test_dashboard_on_empty_database() {
    let (app, _state) = create_test_app();
    let token = admin_token(&app).await;

    let (status, body) = send(
        &app,
        authed_request("GET", "/api/summary/dashboard", &token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["students"], 0);
    assert_eq!(body["stats"]["totalPlaced"], 0);
    // No season on record: the calendar year with zeroed analytics
    assert!(body["latestYear"]["year"].as_i64().unwrap() >= 2026);
    assert_eq!(body["latestYear"]["totalCompanies"], 0);
    assert!(body["latestYear"]["companyWise"].as_object().unwrap().is_empty());
    assert!(body["recentCompanies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_requires_admin() {
    let (app, _state) = create_test_app();

    let (status, _) = send(
        &app,
        axum::http::Request::builder()
            .uri("/api/summary/dashboard")
            .method("GET")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
