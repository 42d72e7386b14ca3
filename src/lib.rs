/// Placetrack: a placement drive tracking service
///
/// This library provides the core functionality for tracking campus
/// placement drives: admin-managed user accounts with token auth,
/// students, per-season company drives with selection rounds and final
/// placements, season analytics, and a pre-aggregated dashboard.
///
/// ### Modules
///
/// - `auth`: token minting/verification, password hashing, extractors
/// - `config`: layered configuration (defaults, file, env/CLI)
/// - `db`: database connection management
/// - `dto`: request and response bodies (camelCase wire format)
/// - `errors`: the API error type and its HTTP mapping
/// - `handlers`: the HTTP handlers, one module per resource
/// - `models`: data structures mapping to database tables
/// - `repo`: repository layer for database operations
/// - `schema`: database schema definitions

/// Auth module: tokens, password hashing, request extractors
pub mod auth;

/// Configuration module
pub mod config;

/// Database connection module
pub mod db;

/// Data transfer objects
pub mod dto;

/// API error type
pub mod errors;

/// HTTP handlers
pub mod handlers;

/// Data models module
pub mod models;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use auth::AuthKeys;
use config::Config;
use db::DbPool;
use handlers::*;

/// Shared state handed to every handler
pub struct AppState {
    /// The database connection pool
    pub pool: Arc<DbPool>,
    /// Token signing material and lifetimes
    pub auth: AuthKeys,
    /// Password applied by the admin reset endpoint
    pub default_reset_password: String,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Builds the application state from a pool and the resolved config
    pub fn from_config(pool: Arc<DbPool>, config: &Config) -> Arc<Self> {
        Arc::new(Self {
            pool,
            auth: AuthKeys::from_config(config),
            default_reset_password: config.default_reset_password.clone(),
            allowed_origins: config.allowed_origins.clone(),
        })
    }
}

/// Builds the credentialed CORS layer for the configured frontends
///
/// Credentialed requests cannot use a wildcard origin, so the allowlist is
/// explicit; unparseable entries are skipped with a warning.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Skipping unparseable CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Creates the application router with all routes
///
/// ### Arguments
///
/// * `state` - The application state shared with all handlers
///
/// ### Returns
///
/// An Axum Router with all routes, the CORS/compression/trace layers, and
/// the state attached
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        // Session endpoints; login/refresh/logout are unauthenticated
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/refresh", post(refresh_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/change-password", post(change_password_handler))
        .route("/api/auth/me", get(me_handler))
        // User administration
        .route("/api/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/api/users/{id}",
            put(update_user_role_handler).delete(delete_user_handler),
        )
        .route("/api/users/{id}/reset-password", post(reset_user_password_handler))
        // Students
        .route(
            "/api/students",
            get(list_students_handler).post(create_student_handler),
        )
        .route("/api/students/count", get(count_students_handler))
        .route("/api/students/stats", get(student_stats_handler))
        .route(
            "/api/students/{id}",
            get(get_student_handler).delete(delete_student_handler),
        )
        // Company drives; destructive edits moved to the ingestion service
        .route("/api/companies", get(list_companies_handler))
        .route(
            "/api/companies/{id}",
            get(get_company_handler).delete(delete_company_handler),
        )
        .route("/api/companies/{id}/rounds", get(get_company_rounds_handler))
        .route(
            "/api/companies/{id}/rounds/{round_id}",
            delete(delete_round_handler),
        )
        // Season analytics
        .route("/api/years", get(list_years_handler))
        // Dashboard
        .route("/api/health", get(health_handler))
        .route("/api/summary/dashboard", get(dashboard_summary_handler))
        .route("/api/admin/initialize-stats", post(initialize_stats_handler))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the embedded migrations
///
/// This function applies all database migrations to set up the schema. It
/// runs at startup and in test setups.
///
/// ### Panics
///
/// This function will panic if the migrations fail to run
pub fn run_migrations(conn: &mut diesel::SqliteConnection) {
    use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

    // Define the embedded migrations
    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    // Run all pending migrations
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
}

#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    let pool = repo::tests::setup_test_db();
    let mut config = config::base_config(None);
    config.jwt_secret = "test-access-secret".to_string();
    config.jwt_refresh_secret = "test-refresh-secret".to_string();
    AppState::from_config(pool, &config)
}
