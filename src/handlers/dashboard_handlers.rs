use axum::{Json, extract::State};
use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::AppState;
use crate::auth::AdminUser;
use crate::dto::{
    CompanyResponse, DashboardCounts, DashboardStats, DashboardSummaryResponse, HealthResponse,
    InitializeStatsResponse, LatestYearSummary,
};
use crate::errors::ApiError;
use crate::repo;

use super::year_handlers::company_wise;

/// Handler for the health check
///
/// This function handles GET requests to `/api/health`. The only
/// unauthenticated endpoint besides the auth flows.
#[instrument]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Handler for the dashboard summary
///
/// This function handles GET requests to `/api/summary/dashboard`.
///
/// Served from the pre-aggregated stats row plus a handful of targeted
/// queries (latest season, its drives, five most recently updated drives)
/// rather than full-table scans.
#[instrument(skip(state, _admin))]
pub async fn dashboard_summary_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<DashboardSummaryResponse>, ApiError> {
    let stats = repo::get_system_stats(&state.pool).map_err(ApiError::Database)?;

    // Most recent season on record, or the calendar year with zeroed
    // analytics when no season exists yet.
    let (season, total_companies, total_placed) =
        match repo::latest_year(&state.pool).map_err(ApiError::Database)? {
            Some(year) => (year.get_year(), year.get_total_companies(), year.get_total_placed()),
            None => {
                debug!("No season on record, falling back to the calendar year");
                (Utc::now().year(), 0, 0)
            }
        };

    let season_companies =
        repo::companies_for_year(&state.pool, season).map_err(ApiError::Database)?;

    let recent = repo::recent_companies(&state.pool, 5).map_err(ApiError::Database)?;

    Ok(Json(DashboardSummaryResponse {
        counts: DashboardCounts {
            years: stats.get_total_years(),
            companies: stats.get_total_companies(),
            students: stats.get_total_students(),
        },
        stats: DashboardStats {
            total_companies: stats.get_total_companies(),
            completed_companies: stats.get_completed_companies(),
            running_companies: stats.get_running_companies(),
            total_placed: stats.get_total_placed(),
        },
        latest_year: LatestYearSummary {
            year: season,
            company_wise: company_wise(&season_companies),
            total_companies,
            total_placed,
        },
        recent_companies: recent.iter().map(CompanyResponse::from).collect(),
    }))
}

/// Handler for re-anchoring the stats row to the base tables
///
/// This function handles POST requests to `/api/admin/initialize-stats`.
/// Intended to be called once after deployment.
#[instrument(skip(state, _admin))]
pub async fn initialize_stats_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<InitializeStatsResponse>, ApiError> {
    let stats = repo::initialize_system_stats(&state.pool).map_err(ApiError::Database)?;

    info!("System stats initialized");

    Ok(Json(InitializeStatsResponse {
        success: true,
        message: "System stats initialized".to_string(),
        stats,
    }))
}
