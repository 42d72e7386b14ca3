use crate::db::DbPool;
use crate::models::{DriveStatus, PlacementStatus, SystemStats};
use crate::schema::{companies, students, system_stats, years};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{info, instrument};

/// Retrieves the pre-aggregated dashboard summary
///
/// Returns an all-zero summary when the row has never been initialized,
/// so the dashboard renders before the first `initialize` call.
#[instrument(skip(pool))]
pub fn get_system_stats(pool: &DbPool) -> Result<SystemStats> {
    let conn = &mut pool.get()?;
    Ok(load_stats_row(conn)?.unwrap_or_else(SystemStats::empty))
}

/// Recomputes the dashboard summary row from the base tables
///
/// Intended to be called once after deployment, or whenever the
/// incremental counters need to be re-anchored to reality.
#[instrument(skip(pool))]
pub fn initialize_system_stats(pool: &DbPool) -> Result<SystemStats> {
    let conn = &mut pool.get()?;

    let stats = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let total_years: i64 = years::table.count().get_result(conn)?;

        let company_statuses: Vec<DriveStatus> =
            companies::table.select(companies::status).load(conn)?;
        let completed = company_statuses
            .iter()
            .filter(|s| **s == DriveStatus::Completed)
            .count();
        let running = company_statuses
            .iter()
            .filter(|s| **s == DriveStatus::Running)
            .count();

        let student_rows: Vec<(PlacementStatus, i32)> = students::table
            .select((students::current_status, students::total_offers))
            .load(conn)?;
        let placed = student_rows
            .iter()
            .filter(|(status, _)| *status == PlacementStatus::Placed)
            .count();
        let not_placed = student_rows.len() - placed;
        let total_offers: i32 = student_rows.iter().map(|(_, offers)| offers).sum();

        let stats = SystemStats::new(
            total_years as i32,
            company_statuses.len() as i32,
            completed as i32,
            running as i32,
            student_rows.len() as i32,
            placed as i32,
            not_placed as i32,
            total_offers,
            Utc::now().naive_utc(),
        );

        save_stats_row(conn, &stats)?;
        Ok(stats)
    })?;

    info!(
        "Initialized system stats: {} students, {} companies, {} years",
        stats.get_total_students(),
        stats.get_total_companies(),
        stats.get_total_years()
    );

    Ok(stats)
}

/// Loads the stats row if it has been initialized
pub(crate) fn load_stats_row(conn: &mut SqliteConnection) -> Result<Option<SystemStats>> {
    let row = system_stats::table
        .first::<SystemStats>(conn)
        .optional()?;
    Ok(row)
}

fn save_stats_row(conn: &mut SqliteConnection, stats: &SystemStats) -> Result<()> {
    diesel::replace_into(system_stats::table)
        .values(stats.clone())
        .execute(conn)?;
    Ok(())
}

/// Subtracts without letting a counter go below zero
fn floored(value: i32, delta: i32) -> i32 {
    (value - delta).max(0)
}

/// Records a newly created student in the summary
///
/// No-op when the stats row has never been initialized; the next
/// `initialize` call picks the student up instead.
pub(crate) fn on_student_created(conn: &mut SqliteConnection) -> Result<()> {
    if let Some(stats) = load_stats_row(conn)? {
        let updated = SystemStats::new(
            stats.get_total_years(),
            stats.get_total_companies(),
            stats.get_completed_companies(),
            stats.get_running_companies(),
            stats.get_total_students() + 1,
            stats.get_total_placed(),
            stats.get_total_not_placed() + 1,
            stats.get_total_offers(),
            Utc::now().naive_utc(),
        );
        save_stats_row(conn, &updated)?;
    }
    Ok(())
}

/// Winds a deleted student out of the summary
pub(crate) fn on_student_removed(
    conn: &mut SqliteConnection,
    status: PlacementStatus,
    offers: i32,
) -> Result<()> {
    if let Some(stats) = load_stats_row(conn)? {
        let (placed_delta, not_placed_delta) = match status {
            PlacementStatus::Placed => (1, 0),
            PlacementStatus::NotPlaced => (0, 1),
        };
        let updated = SystemStats::new(
            stats.get_total_years(),
            stats.get_total_companies(),
            stats.get_completed_companies(),
            stats.get_running_companies(),
            floored(stats.get_total_students(), 1),
            floored(stats.get_total_placed(), placed_delta),
            floored(stats.get_total_not_placed(), not_placed_delta),
            floored(stats.get_total_offers(), offers),
            Utc::now().naive_utc(),
        );
        save_stats_row(conn, &updated)?;
    }
    Ok(())
}

/// Records a newly created drive in the summary
pub(crate) fn on_company_created(conn: &mut SqliteConnection) -> Result<()> {
    if let Some(stats) = load_stats_row(conn)? {
        let updated = SystemStats::new(
            stats.get_total_years(),
            stats.get_total_companies() + 1,
            stats.get_completed_companies(),
            stats.get_running_companies() + 1,
            stats.get_total_students(),
            stats.get_total_placed(),
            stats.get_total_not_placed(),
            stats.get_total_offers(),
            Utc::now().naive_utc(),
        );
        save_stats_row(conn, &updated)?;
    }
    Ok(())
}

/// Moves a drive between the running and completed buckets
pub(crate) fn on_company_status_changed(
    conn: &mut SqliteConnection,
    from: DriveStatus,
    to: DriveStatus,
) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(stats) = load_stats_row(conn)? {
        let (completed, running) = match to {
            DriveStatus::Completed => (
                stats.get_completed_companies() + 1,
                floored(stats.get_running_companies(), 1),
            ),
            DriveStatus::Running => (
                floored(stats.get_completed_companies(), 1),
                stats.get_running_companies() + 1,
            ),
        };
        let updated = SystemStats::new(
            stats.get_total_years(),
            stats.get_total_companies(),
            completed,
            running,
            stats.get_total_students(),
            stats.get_total_placed(),
            stats.get_total_not_placed(),
            stats.get_total_offers(),
            Utc::now().naive_utc(),
        );
        save_stats_row(conn, &updated)?;
    }
    Ok(())
}

/// Records a final selection in the summary
///
/// `first_offer` moves the student from the not-placed bucket to the
/// placed bucket; further offers only bump the offer total.
pub(crate) fn on_placement_recorded(
    conn: &mut SqliteConnection,
    first_offer: bool,
) -> Result<()> {
    if let Some(stats) = load_stats_row(conn)? {
        let (placed, not_placed) = if first_offer {
            (
                stats.get_total_placed() + 1,
                floored(stats.get_total_not_placed(), 1),
            )
        } else {
            (stats.get_total_placed(), stats.get_total_not_placed())
        };
        let updated = SystemStats::new(
            stats.get_total_years(),
            stats.get_total_companies(),
            stats.get_completed_companies(),
            stats.get_running_companies(),
            stats.get_total_students(),
            placed,
            not_placed,
            stats.get_total_offers() + 1,
            Utc::now().naive_utc(),
        );
        save_stats_row(conn, &updated)?;
    }
    Ok(())
}

/// Records a newly opened season in the summary
pub(crate) fn on_year_created(conn: &mut SqliteConnection) -> Result<()> {
    if let Some(stats) = load_stats_row(conn)? {
        let updated = SystemStats::new(
            stats.get_total_years() + 1,
            stats.get_total_companies(),
            stats.get_completed_companies(),
            stats.get_running_companies(),
            stats.get_total_students(),
            stats.get_total_placed(),
            stats.get_total_not_placed(),
            stats.get_total_offers(),
            Utc::now().naive_utc(),
        );
        save_stats_row(conn, &updated)?;
    }
    Ok(())
}
