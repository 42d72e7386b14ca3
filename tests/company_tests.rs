/// Integration tests for the company drive endpoints.

mod common;

use axum::http::StatusCode;
use common::*;
use placetrack::models::JsonValue;
use placetrack::repo;
use serde_json::json;

#[tokio::test]
async fn test_list_companies_sorted() {
    let (app, state) = create_test_app();
    let token = admin_token(&app).await;

    repo::create_company(&state.pool, "Acme".to_string(), 2025).unwrap();
    repo::create_company(&state.pool, "Acme".to_string(), 2026).unwrap();
    repo::create_company(&state.pool, "Zephyr Labs".to_string(), 2026).unwrap();

    let (status, body) = send(&app, authed_request("GET", "/api/companies", &token)).await;

    assert_eq!(status, StatusCode::OK);
    let companies = body.as_array().unwrap();
    assert_eq!(companies.len(), 3);
    assert_eq!(companies[0]["year"], 2026);
    assert_eq!(companies[0]["companyName"], "Zephyr Labs");
    assert_eq!(companies[1]["companyName"], "Acme");
    assert_eq!(companies[2]["year"], 2025);
    assert!(companies[0]["companyYearId"].is_string());
}

#[tokio::test]
async fn test_get_company_with_placements() {
    let (app, state) = create_test_app();
    let token = admin_token(&app).await;

    let student_id = create_student_via_api(&app, &token, "Asha Rao", "23B81A0501").await;
    let company = repo::create_company(&state.pool, "Vertex Systems".to_string(), 2026).unwrap();
    repo::record_placement(
        &state.pool,
        &company.get_id(),
        &student_id,
        JsonValue::from(json!({"package": "12 LPA"})),
    )
    .unwrap();

    let (status, body) = send(
        &app,
        authed_request("GET", &format!("/api/companies/{}", company.get_id()), &token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companyYearId"], company.get_id());
    assert_eq!(body["companyName"], "Vertex Systems");
    assert_eq!(body["totalPlaced"], 1);
    assert_eq!(body["placements"][&student_id]["package"], "12 LPA");
}

#[tokio::test]
async fn test_get_company_not_found() {
    let (app, _state) = create_test_app();
    let token = admin_token(&app).await;

    let (status, body) = send(
        &app,
        authed_request("GET", "/api/companies/missing", &token),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Company not found");
}

#[tokio::test]
async fn test_company_rounds_with_data() {
    let (app, state) = create_test_app();
    let token = admin_token(&app).await;

    let student_id = create_student_via_api(&app, &token, "Asha Rao", "23B81A0501").await;
    let company = repo::create_company(&state.pool, "Vertex Systems".to_string(), 2026).unwrap();

    // Created out of order; the endpoint sorts by round number
    let hr = repo::create_round(&state.pool, &company.get_id(), 2, "HR Interview".to_string())
        .unwrap();
    let online = repo::create_round(&state.pool, &company.get_id(), 1, "Online Test".to_string())
        .unwrap();
    let entry = repo::add_round_entry(
        &state.pool,
        &online.get_id(),
        &student_id,
        json!({"score": 91}).into(),
    )
    .unwrap();

    let (status, body) = send(
        &app,
        authed_request(
            "GET",
            &format!("/api/companies/{}/rounds", company.get_id()),
            &token,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rounds = body.as_array().unwrap();
    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[0]["roundNumber"], 1);
    assert_eq!(rounds[0]["name"], "Online Test");
    assert_eq!(rounds[0]["roundId"], online.get_id());
    assert_eq!(rounds[0]["data"][entry.get_id()]["score"], 91);
    assert_eq!(rounds[1]["roundNumber"], 2);
    assert_eq!(rounds[1]["roundId"], hr.get_id());
    assert!(rounds[1]["data"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_rounds_for_missing_company() {
    let (app, _state) = create_test_app();
    let token = admin_token(&app).await;

    let (status, body) = send(
        &app,
        authed_request("GET", "/api/companies/missing/rounds", &token),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Company not found");
}

#[tokio::test]
async fn test_delete_endpoints_are_gone() {
    let (app, state) = create_test_app();
    let token = admin_token(&app).await;

    let company = repo::create_company(&state.pool, "Vertex Systems".to_string(), 2026).unwrap();

    let (status, body) = send(
        &app,
        authed_request("DELETE", &format!("/api/companies/{}", company.get_id()), &token),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        authed_request(
            "DELETE",
            &format!("/api/companies/{}/rounds/some-round", company.get_id()),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);

    // The drive itself is untouched
    let (status, _) = send(
        &app,
        authed_request("GET", &format!("/api/companies/{}", company.get_id()), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_companies_require_admin() {
    let (app, _state) = create_test_app();

    let (status, body) = send(
        &app,
        axum::http::Request::builder()
            .uri("/api/companies")
            .method("GET")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is missing");
}
