use axum::{Json, extract::State};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

use crate::AppState;
use crate::auth::AdminUser;
use crate::dto::{CompanyWiseEntry, YearResponse};
use crate::errors::ApiError;
use crate::models::Company;
use crate::repo;

/// Builds a season's per-company breakdown from its drives
pub(crate) fn company_wise(companies: &[Company]) -> BTreeMap<String, CompanyWiseEntry> {
    companies
        .iter()
        .map(|company| {
            (
                company.get_id(),
                CompanyWiseEntry {
                    company_name: company.get_company_name(),
                    placed: company.get_total_placed(),
                    status: company.get_status(),
                },
            )
        })
        .collect()
}

/// Handler for listing season analytics
///
/// This function handles GET requests to `/api/years`. Seasons come back
/// most recent first, each with its per-company breakdown derived from
/// the drives themselves.
#[instrument(skip(state, _admin))]
pub async fn list_years_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<Vec<YearResponse>>, ApiError> {
    let seasons = repo::list_years(&state.pool).map_err(ApiError::Database)?;

    let mut result = Vec::with_capacity(seasons.len());
    for season in seasons {
        let companies = repo::companies_for_year(&state.pool, season.get_year())
            .map_err(ApiError::Database)?;

        result.push(YearResponse {
            year: season.get_year(),
            total_companies: season.get_total_companies(),
            total_placed: season.get_total_placed(),
            total_students_participated: season.get_total_students_participated(),
            company_wise: company_wise(&companies),
            updated_at: season.get_updated_at(),
        });
    }

    Ok(Json(result))
}
