/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for interacting with the database, one submodule
/// per aggregate: user accounts, students, company drives, season
/// analytics, and the pre-aggregated system stats.
///
/// The repository pattern abstracts away the details of database access
/// and provides a clean API for the rest of the application to use.
/// Multi-row write paths (placements, cascading deletes) run inside a
/// single transaction so counters and rows can never drift apart.

mod user_repo;
pub use user_repo::*;

mod student_repo;
pub use student_repo::*;

mod company_repo;
pub use company_repo::*;

mod year_repo;
pub use year_repo::*;

mod stats_repo;
pub use stats_repo::*;

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use crate::db::{self, DbPool};

    /// Sets up a test database with migrations applied
    ///
    /// Uses a unique shared in-memory database for each test. Plain
    /// ":memory:" gives each connection its own separate database, so
    /// migrations run on one connection wouldn't be visible on others. A
    /// unique URI with cache=shared lets all connections in this pool share
    /// one in-memory database while remaining isolated from other tests.
    pub fn setup_test_db() -> Arc<DbPool> {
        let unique_id = uuid::Uuid::new_v4();
        let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
        let pool = db::init_pool(&database_url);

        // Run migrations on the in-memory database
        let mut conn = pool.get().expect("Failed to get connection");
        crate::run_migrations(&mut conn);

        Arc::new(pool)
    }
}
