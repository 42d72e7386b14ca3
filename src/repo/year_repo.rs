use crate::db::DbPool;
use crate::models::Year;
use crate::repo::stats_repo;
use crate::schema::years;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

/// Retrieves all season analytics, most recent season first
#[instrument(skip(pool))]
pub fn list_years(pool: &DbPool) -> Result<Vec<Year>> {
    debug!("Listing all years");

    let conn = &mut pool.get()?;

    let result = years::table
        .order(years::year.desc())
        .load::<Year>(conn)?;

    info!("Retrieved {} years", result.len());

    Ok(result)
}

/// Retrieves one season's analytics
#[instrument(skip(pool), fields(year = season))]
pub fn get_year(pool: &DbPool, season: i32) -> Result<Option<Year>> {
    let conn = &mut pool.get()?;

    let result = years::table.find(season).first::<Year>(conn).optional()?;

    Ok(result)
}

/// Retrieves the most recent season on record
#[instrument(skip(pool))]
pub fn latest_year(pool: &DbPool) -> Result<Option<Year>> {
    let conn = &mut pool.get()?;

    let result = years::table
        .order(years::year.desc())
        .first::<Year>(conn)
        .optional()?;

    Ok(result)
}

/// Creates the analytics row for a season if it does not exist yet
pub(crate) fn ensure_year(conn: &mut SqliteConnection, season: i32) -> Result<()> {
    let existing = years::table.find(season).first::<Year>(conn).optional()?;
    if existing.is_none() {
        diesel::insert_into(years::table)
            .values(Year::new(season))
            .execute(conn)?;
        stats_repo::on_year_created(conn)?;
        info!("Opened season {}", season);
    }
    Ok(())
}

/// Counts one more drive for the season
pub(crate) fn add_company_to_year(conn: &mut SqliteConnection, season: i32) -> Result<()> {
    ensure_year(conn, season)?;
    diesel::update(years::table.find(season))
        .set((
            years::total_companies.eq(years::total_companies + 1),
            years::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    Ok(())
}

/// Counts one more participating student for the season
pub(crate) fn add_participant_to_year(conn: &mut SqliteConnection, season: i32) -> Result<()> {
    ensure_year(conn, season)?;
    diesel::update(years::table.find(season))
        .set((
            years::total_students_participated.eq(years::total_students_participated + 1),
            years::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    Ok(())
}

/// Counts one more final selection for the season
pub(crate) fn add_placement_to_year(conn: &mut SqliteConnection, season: i32) -> Result<()> {
    ensure_year(conn, season)?;
    diesel::update(years::table.find(season))
        .set((
            years::total_placed.eq(years::total_placed + 1),
            years::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    Ok(())
}

/// Winds a deleted student's contribution out of a season's analytics
///
/// Counters floor at zero; a missing season row is left missing.
pub(crate) fn wind_back_year(
    conn: &mut SqliteConnection,
    season: i32,
    participants: i32,
    placed: i32,
) -> Result<()> {
    if let Some(year) = years::table.find(season).first::<Year>(conn).optional()? {
        diesel::update(years::table.find(season))
            .set((
                years::total_students_participated
                    .eq((year.get_total_students_participated() - participants).max(0)),
                years::total_placed.eq((year.get_total_placed() - placed).max(0)),
                years::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
    }
    Ok(())
}
