use crate::db::DbPool;
use crate::models::{
    Application, Company, DriveStatus, JsonValue, Placement, PlacementStatus, Round, RoundEntry,
    Student,
};
use crate::repo::{stats_repo, year_repo};
use crate::schema::{applications, companies, placements, round_entries, rounds, students};
use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

/// Creates a new drive for a season
///
/// Opens the season's analytics row when this is its first drive, and
/// counts the drive in both the season analytics and the system stats.
#[instrument(skip(pool), fields(company_name = %company_name, year = season))]
pub fn create_company(pool: &DbPool, company_name: String, season: i32) -> Result<Company> {
    debug!("Creating new company drive");

    let conn = &mut pool.get()?;

    let company = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let new_company = Company::new(company_name, season);

        diesel::insert_into(companies::table)
            .values(new_company.clone())
            .execute(conn)?;

        year_repo::add_company_to_year(conn, season)?;
        stats_repo::on_company_created(conn)?;

        Ok(new_company)
    })?;

    info!("Successfully created company drive with id: {}", company.get_id());

    Ok(company)
}

/// Retrieves a drive by its company-year ID
#[instrument(skip(pool), fields(company_year_id = %id))]
pub fn get_company(pool: &DbPool, id: &str) -> Result<Option<Company>> {
    let conn = &mut pool.get()?;

    let result = companies::table
        .find(id)
        .first::<Company>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves all drives, most recent season first, names descending within
/// a season
#[instrument(skip(pool))]
pub fn list_companies(pool: &DbPool) -> Result<Vec<Company>> {
    debug!("Listing all companies");

    let conn = &mut pool.get()?;

    let result = companies::table
        .order((companies::year.desc(), companies::company_name.desc()))
        .load::<Company>(conn)?;

    info!("Retrieved {} companies", result.len());

    Ok(result)
}

/// Retrieves the most recently updated drives
#[instrument(skip(pool))]
pub fn recent_companies(pool: &DbPool, limit: i64) -> Result<Vec<Company>> {
    let conn = &mut pool.get()?;

    let result = companies::table
        .order(companies::updated_at.desc())
        .limit(limit)
        .load::<Company>(conn)?;

    Ok(result)
}

/// Retrieves all drives belonging to one season
#[instrument(skip(pool), fields(year = season))]
pub fn companies_for_year(pool: &DbPool, season: i32) -> Result<Vec<Company>> {
    let conn = &mut pool.get()?;

    let result = companies::table
        .filter(companies::year.eq(season))
        .load::<Company>(conn)?;

    Ok(result)
}

/// Moves a drive to a new status, keeping the system stats buckets current
#[instrument(skip(pool), fields(company_year_id = %id, status = %status))]
pub fn update_company_status(pool: &DbPool, id: &str, status: DriveStatus) -> Result<()> {
    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        let company = companies::table
            .find(id)
            .first::<Company>(conn)
            .optional()?
            .ok_or_else(|| anyhow!("Company {id} not found"))?;

        if company.get_status() == status {
            return Ok(());
        }

        diesel::update(companies::table.find(id))
            .set((
                companies::status.eq(status),
                companies::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        stats_repo::on_company_status_changed(conn, company.get_status(), status)?;

        Ok(())
    })
}

/// Records a student's application to a drive
///
/// Idempotent: an existing application is returned unchanged. The drive's
/// applied counter always moves; the season's participant counter only
/// moves on the student's first application of that season.
#[instrument(skip(pool), fields(student_id = %student_id, company_year_id = %company_id))]
pub fn record_application(pool: &DbPool, student_id: &str, company_id: &str) -> Result<Application> {
    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        let company = companies::table
            .find(company_id)
            .first::<Company>(conn)
            .optional()?
            .ok_or_else(|| anyhow!("Company {company_id} not found"))?;

        let student = students::table
            .find(student_id)
            .first::<Student>(conn)
            .optional()?
            .ok_or_else(|| anyhow!("Student {student_id} not found"))?;

        record_application_on(conn, &student, &company)
    })
}

/// Conn-level application write, shared by the placement path
pub(crate) fn record_application_on(
    conn: &mut SqliteConnection,
    student: &Student,
    company: &Company,
) -> Result<Application> {
    let existing = applications::table
        .find((student.get_id(), company.get_id()))
        .first::<Application>(conn)
        .optional()?;

    if let Some(application) = existing {
        return Ok(application);
    }

    let season = company.get_year();
    let prior_in_season: i64 = applications::table
        .filter(applications::student_id.eq(student.get_id()))
        .filter(applications::year.eq(season))
        .count()
        .get_result(conn)?;

    let application = Application::new(student.get_id(), company.get_id(), season);
    diesel::insert_into(applications::table)
        .values(application.clone())
        .execute(conn)?;

    diesel::update(companies::table.find(company.get_id()))
        .set((
            companies::total_applied.eq(companies::total_applied + 1),
            companies::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    if prior_in_season == 0 {
        year_repo::add_participant_to_year(conn, season)?;
    } else {
        year_repo::ensure_year(conn, season)?;
    }

    Ok(application)
}

/// Records a student's final selection in a drive
///
/// One transaction covering the placement row, the application's final
/// flag, the drive's placed counter, the student's status and offer count,
/// the season analytics and the system stats.
#[instrument(skip(pool, data), fields(student_id = %student_id, company_year_id = %company_id))]
pub fn record_placement(
    pool: &DbPool,
    company_id: &str,
    student_id: &str,
    data: JsonValue,
) -> Result<Placement> {
    let conn = &mut pool.get()?;

    let placement = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let company = companies::table
            .find(company_id)
            .first::<Company>(conn)
            .optional()?
            .ok_or_else(|| anyhow!("Company {company_id} not found"))?;

        let student = students::table
            .find(student_id)
            .first::<Student>(conn)
            .optional()?
            .ok_or_else(|| anyhow!("Student {student_id} not found"))?;

        let application = record_application_on(conn, &student, &company)?;
        if application.is_final_selection() {
            bail!("Student {student_id} is already placed in drive {company_id}");
        }

        diesel::update(applications::table.find((student.get_id(), company.get_id())))
            .set(applications::final_selection.eq(true))
            .execute(conn)?;

        let placement = Placement::new(company.get_id(), student.get_id(), data);
        diesel::insert_into(placements::table)
            .values(placement.clone())
            .execute(conn)?;

        diesel::update(companies::table.find(company.get_id()))
            .set((
                companies::total_placed.eq(companies::total_placed + 1),
                companies::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        let first_offer = student.get_total_offers() == 0;
        diesel::update(students::table.find(student.get_id()))
            .set((
                students::current_status.eq(PlacementStatus::Placed),
                students::total_offers.eq(students::total_offers + 1),
                students::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        year_repo::add_placement_to_year(conn, company.get_year())?;
        stats_repo::on_placement_recorded(conn, first_offer)?;

        Ok(placement)
    })?;

    info!(
        "Recorded placement of student {} in drive {}",
        student_id, company_id
    );

    Ok(placement)
}

/// Creates a selection round within a drive
#[instrument(skip(pool), fields(company_year_id = %company_id))]
pub fn create_round(
    pool: &DbPool,
    company_id: &str,
    round_number: i32,
    name: String,
) -> Result<Round> {
    let conn = &mut pool.get()?;

    let exists = companies::table
        .find(company_id)
        .first::<Company>(conn)
        .optional()?
        .is_some();
    if !exists {
        bail!("Company {company_id} not found");
    }

    let round = Round::new(company_id.to_string(), round_number, name);
    diesel::insert_into(rounds::table)
        .values(round.clone())
        .execute(conn)?;

    Ok(round)
}

/// Adds one student's sheet row to a round
#[instrument(skip(pool, data), fields(round_id = %round_id, student_id = %student_id))]
pub fn add_round_entry(
    pool: &DbPool,
    round_id: &str,
    student_id: &str,
    data: JsonValue,
) -> Result<RoundEntry> {
    let conn = &mut pool.get()?;

    let exists = rounds::table
        .find(round_id)
        .first::<Round>(conn)
        .optional()?
        .is_some();
    if !exists {
        bail!("Round {round_id} not found");
    }

    let entry = RoundEntry::new(round_id.to_string(), student_id.to_string(), data);
    diesel::insert_into(round_entries::table)
        .values(entry.clone())
        .execute(conn)?;

    Ok(entry)
}

/// Retrieves a drive's rounds in order, each with its sheet rows
#[instrument(skip(pool), fields(company_year_id = %company_id))]
pub fn rounds_with_entries(
    pool: &DbPool,
    company_id: &str,
) -> Result<Vec<(Round, Vec<RoundEntry>)>> {
    let conn = &mut pool.get()?;

    let round_rows = rounds::table
        .filter(rounds::company_id.eq(company_id))
        .order(rounds::round_number.asc())
        .load::<Round>(conn)?;

    let round_ids: Vec<String> = round_rows.iter().map(Round::get_id).collect();
    let entries = round_entries::table
        .filter(round_entries::round_id.eq_any(&round_ids))
        .load::<RoundEntry>(conn)?;

    let result = round_rows
        .into_iter()
        .map(|round| {
            let round_id = round.get_id();
            let for_round = entries
                .iter()
                .filter(|entry| entry.get_round_id() == round_id)
                .cloned()
                .collect();
            (round, for_round)
        })
        .collect();

    Ok(result)
}

/// Retrieves a drive's final placements
#[instrument(skip(pool), fields(company_year_id = %company_id))]
pub fn placements_for_company(pool: &DbPool, company_id: &str) -> Result<Vec<Placement>> {
    let conn = &mut pool.get()?;

    let result = placements::table
        .filter(placements::company_id.eq(company_id))
        .load::<Placement>(conn)?;

    Ok(result)
}
