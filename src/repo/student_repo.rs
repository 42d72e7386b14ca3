use crate::db::DbPool;
use crate::models::{Application, Company, Student};
use crate::repo::{stats_repo, year_repo};
use crate::schema::{applications, companies, placements, round_entries, rounds, students};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Creates a new student in the database
///
/// Uniqueness of the roll number and email is enforced by the schema; the
/// handlers pre-check both to produce their specific conflict messages.
#[instrument(skip(pool), fields(roll_number = %roll_number))]
pub fn create_student(
    pool: &DbPool,
    name: String,
    roll_number: String,
    email: String,
) -> Result<Student> {
    debug!("Creating new student");

    let conn = &mut pool.get()?;

    let student = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let new_student = Student::new(name, roll_number, email);

        diesel::insert_into(students::table)
            .values(new_student.clone())
            .execute(conn)?;

        stats_repo::on_student_created(conn)?;

        Ok(new_student)
    })?;

    info!("Successfully created student with id: {}", student.get_id());

    Ok(student)
}

/// Retrieves a student from the database by their ID
#[instrument(skip(pool), fields(student_id = %id))]
pub fn get_student(pool: &DbPool, id: &str) -> Result<Option<Student>> {
    let conn = &mut pool.get()?;

    let result = students::table.find(id).first::<Student>(conn).optional()?;

    Ok(result)
}

/// Retrieves a student by their roll number
#[instrument(skip(pool), fields(roll_number = %roll_number))]
pub fn get_student_by_roll_number(pool: &DbPool, roll_number: &str) -> Result<Option<Student>> {
    let conn = &mut pool.get()?;

    let result = students::table
        .filter(students::roll_number.eq(roll_number))
        .first::<Student>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a student by their email
#[instrument(skip(pool), fields(email = %email))]
pub fn get_student_by_email(pool: &DbPool, email: &str) -> Result<Option<Student>> {
    let conn = &mut pool.get()?;

    let result = students::table
        .filter(students::email.eq(email))
        .first::<Student>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves students sorted by name, optionally filtered by a search term
///
/// The term matches case-insensitively against name, roll number and
/// email. A blank term is treated as no filter.
#[instrument(skip(pool))]
pub fn list_students(pool: &DbPool, search: Option<&str>) -> Result<Vec<Student>> {
    debug!("Listing students");

    let conn = &mut pool.get()?;

    let mut query = students::table.into_boxed();

    if let Some(term) = search {
        let term = term.trim();
        if !term.is_empty() {
            let pattern = format!("%{}%", term);
            query = query.filter(
                students::name
                    .like(pattern.clone())
                    .or(students::roll_number.like(pattern.clone()))
                    .or(students::email.like(pattern)),
            );
        }
    }

    let result = query
        .order(students::name.asc())
        .load::<Student>(conn)?;

    info!("Retrieved {} students", result.len());

    Ok(result)
}

/// Counts all students
#[instrument(skip(pool))]
pub fn count_students(pool: &DbPool) -> Result<i64> {
    let conn = &mut pool.get()?;

    let count = students::table.count().get_result(conn)?;

    Ok(count)
}

/// Retrieves one student's application rows
#[instrument(skip(pool), fields(student_id = %id))]
pub fn applications_for_student(pool: &DbPool, id: &str) -> Result<Vec<Application>> {
    let conn = &mut pool.get()?;

    let result = applications::table
        .filter(applications::student_id.eq(id))
        .load::<Application>(conn)?;

    Ok(result)
}

/// Retrieves the application rows for a set of students
#[instrument(skip(pool, ids))]
pub fn applications_for_students(pool: &DbPool, ids: &[String]) -> Result<Vec<Application>> {
    let conn = &mut pool.get()?;

    let result = applications::table
        .filter(applications::student_id.eq_any(ids))
        .load::<Application>(conn)?;

    Ok(result)
}

/// What a cascading student deletion touched
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CascadeSummary {
    pub companies_affected: i32,
    pub rounds_deleted: i32,
    pub placements_deleted: i32,
    pub years_affected: i32,
}

/// Deletes a student and cascades the removal through every dependent row
///
/// One transaction covering, in order: the student's placements, their
/// rows in each affected drive's rounds, each drive's applied/placed
/// counters, the season analytics of every affected year, the application
/// rows, the student row itself, and finally the system stats. Either
/// everything commits or nothing does.
///
/// ### Returns
///
/// `None` when the student does not exist; otherwise the deleted student
/// and a summary of the cascade.
#[instrument(skip(pool), fields(student_id = %id))]
pub fn delete_student_cascade(
    pool: &DbPool,
    id: &str,
) -> Result<Option<(Student, CascadeSummary)>> {
    let conn = &mut pool.get()?;

    let outcome = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let Some(student) = students::table.find(id).first::<Student>(conn).optional()? else {
            return Ok(None);
        };

        debug!(
            "Deleting student {}: status={}, offers={}",
            id,
            student.get_current_status(),
            student.get_total_offers()
        );

        let student_applications = applications::table
            .filter(applications::student_id.eq(id))
            .load::<Application>(conn)?;

        let mut summary = CascadeSummary::default();
        let mut seasons: BTreeSet<i32> = BTreeSet::new();

        for application in &student_applications {
            summary.companies_affected += 1;
            seasons.insert(application.get_year());

            let was_placed = application.is_final_selection();
            if was_placed {
                let deleted = diesel::delete(
                    placements::table
                        .filter(placements::company_id.eq(application.get_company_id()))
                        .filter(placements::student_id.eq(id)),
                )
                .execute(conn)?;
                summary.placements_deleted += deleted as i32;
            }

            // The student's rows in this drive's round sheets
            let round_ids: Vec<String> = rounds::table
                .filter(rounds::company_id.eq(application.get_company_id()))
                .select(rounds::id)
                .load(conn)?;
            if !round_ids.is_empty() {
                let deleted = diesel::delete(
                    round_entries::table
                        .filter(round_entries::round_id.eq_any(&round_ids))
                        .filter(round_entries::student_id.eq(id)),
                )
                .execute(conn)?;
                summary.rounds_deleted += deleted as i32;
            }

            // Wind the student out of the drive's counters, flooring at zero
            if let Some(company) = companies::table
                .find(application.get_company_id())
                .first::<Company>(conn)
                .optional()?
            {
                let placed_delta = if was_placed { 1 } else { 0 };
                diesel::update(companies::table.find(application.get_company_id()))
                    .set((
                        companies::total_applied.eq((company.get_total_applied() - 1).max(0)),
                        companies::total_placed
                            .eq((company.get_total_placed() - placed_delta).max(0)),
                        companies::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)?;
            }
        }

        for season in &seasons {
            let placed_in_season = student_applications
                .iter()
                .filter(|app| app.get_year() == *season && app.is_final_selection())
                .count() as i32;
            year_repo::wind_back_year(conn, *season, 1, placed_in_season)?;
        }
        summary.years_affected = seasons.len() as i32;

        diesel::delete(applications::table.filter(applications::student_id.eq(id)))
            .execute(conn)?;
        diesel::delete(students::table.find(id)).execute(conn)?;

        stats_repo::on_student_removed(
            conn,
            student.get_current_status(),
            student.get_total_offers(),
        )?;

        Ok(Some((student, summary)))
    })?;

    if let Some((_, summary)) = &outcome {
        info!(
            "Student deletion complete: {} companies, {} round rows, {} placements, {} years",
            summary.companies_affected,
            summary.rounds_deleted,
            summary.placements_deleted,
            summary.years_affected
        );
    }

    Ok(outcome)
}
