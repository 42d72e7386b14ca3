use axum::{
    Json,
    extract::{Path, State},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::AppState;
use crate::auth::AdminUser;
use crate::dto::{CompanyDetailResponse, CompanyResponse, RoundResponse};
use crate::errors::ApiError;
use crate::repo;

/// Handler for listing all company drives
///
/// This function handles GET requests to `/api/companies`. Drives are
/// sorted most recent season first.
#[instrument(skip(state, _admin))]
pub async fn list_companies_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<Vec<CompanyResponse>>, ApiError> {
    let companies = repo::list_companies(&state.pool).map_err(ApiError::Database)?;

    Ok(Json(companies.iter().map(CompanyResponse::from).collect()))
}

/// Handler for retrieving a drive with its placements
///
/// This function handles GET requests to `/api/companies/{id}`. The
/// placements come back as a map keyed by student ID.
#[instrument(skip(state, _admin), fields(company_year_id = %company_year_id))]
pub async fn get_company_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(company_year_id): Path<String>,
) -> Result<Json<CompanyDetailResponse>, ApiError> {
    let company = repo::get_company(&state.pool, &company_year_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("Company"))?;

    let placements = repo::placements_for_company(&state.pool, &company_year_id)
        .map_err(ApiError::Database)?
        .into_iter()
        .map(|placement| (placement.get_student_id(), placement.get_data().0))
        .collect::<BTreeMap<_, _>>();

    debug!("Company {} has {} placements", company_year_id, placements.len());

    Ok(Json(CompanyDetailResponse {
        company: CompanyResponse::from(&company),
        placements,
    }))
}

/// Handler for retrieving a drive's rounds with their sheet rows
///
/// This function handles GET requests to `/api/companies/{id}/rounds`.
/// Rounds come back ordered by round number, each with a `data` map keyed
/// by entry ID.
#[instrument(skip(state, _admin), fields(company_year_id = %company_year_id))]
pub async fn get_company_rounds_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(company_year_id): Path<String>,
) -> Result<Json<Vec<RoundResponse>>, ApiError> {
    repo::get_company(&state.pool, &company_year_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("Company"))?;

    let rounds = repo::rounds_with_entries(&state.pool, &company_year_id)
        .map_err(ApiError::Database)?
        .into_iter()
        .map(|(round, entries)| RoundResponse {
            round_id: round.get_id(),
            round_number: round.get_round_number(),
            name: round.get_name(),
            data: entries
                .into_iter()
                .map(|entry| (entry.get_id(), entry.get_data().0))
                .collect(),
        })
        .collect();

    Ok(Json(rounds))
}

/// Handler for the retired drive deletion endpoint
///
/// This function handles DELETE requests to `/api/companies/{id}`.
/// Destructive drive edits live in the separate ingestion service; this
/// endpoint only reports where they went.
#[instrument(skip(_admin), fields(company_year_id = %company_year_id))]
pub async fn delete_company_handler(
    _admin: AdminUser,
    Path(company_year_id): Path<String>,
) -> Result<(), ApiError> {
    Err(ApiError::Gone(
        "Delete operations moved to the drive ingestion service".to_string(),
    ))
}

/// Handler for the retired round deletion endpoint
///
/// This function handles DELETE requests to
/// `/api/companies/{id}/rounds/{round_id}`.
#[instrument(skip(_admin), fields(company_year_id = %path.0, round_id = %path.1))]
pub async fn delete_round_handler(
    _admin: AdminUser,
    Path(path): Path<(String, String)>,
) -> Result<(), ApiError> {
    Err(ApiError::Gone(
        "Delete operations moved to the drive ingestion service".to_string(),
    ))
}
