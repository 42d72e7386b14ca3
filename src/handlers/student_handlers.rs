use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::Query;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::AppState;
use crate::auth::AdminUser;
use crate::dto::{
    CreateStudentDto, DeleteStudentResponse, ListStudentsQuery, StudentCountResponse,
    StudentEnvelope, StudentListResponse, StudentResponse, StudentStatsQuery,
    StudentStatsResponse,
};
use crate::errors::ApiError;
use crate::models::{Application, PlacementStatus, Student};
use crate::repo;

/// Attaches each student's application rows to build wire representations
fn to_responses(students: &[Student], applications: Vec<Application>) -> Vec<StudentResponse> {
    let mut by_student: HashMap<String, Vec<Application>> = HashMap::new();
    for application in applications {
        by_student
            .entry(application.get_student_id())
            .or_default()
            .push(application);
    }

    students
        .iter()
        .map(|student| {
            let apps = by_student.remove(&student.get_id()).unwrap_or_default();
            StudentResponse::from_student(student, &apps)
        })
        .collect()
}

/// Handler for listing students
///
/// This function handles GET requests to `/api/students`.
///
/// `search` filters case-insensitively over name, roll number and email;
/// the placed/not-placed totals describe the whole filtered set, while
/// `limit` caps the page actually returned and `hasMore` flags the cut.
#[instrument(skip(state, _admin, query))]
pub async fn list_students_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<ListStudentsQuery>,
) -> Result<Json<StudentListResponse>, ApiError> {
    debug!("Listing students");

    let students =
        repo::list_students(&state.pool, query.search.as_deref()).map_err(ApiError::Database)?;

    let total = students.len() as i64;
    let placed = students
        .iter()
        .filter(|s| s.get_current_status() == PlacementStatus::Placed)
        .count() as i64;
    let not_placed = total - placed;

    let page: Vec<Student> = match query.limit {
        Some(limit) if limit >= 0 => students.into_iter().take(limit as usize).collect(),
        _ => students,
    };
    let has_more = (page.len() as i64) < total;

    let ids: Vec<String> = page.iter().map(Student::get_id).collect();
    let applications =
        repo::applications_for_students(&state.pool, &ids).map_err(ApiError::Database)?;

    info!("Returning {} of {} students", page.len(), total);

    Ok(Json(StudentListResponse {
        students: to_responses(&page, applications),
        total,
        placed,
        not_placed,
        has_more,
    }))
}

/// Handler for counting students
///
/// This function handles GET requests to `/api/students/count`.
#[instrument(skip(state, _admin))]
pub async fn count_students_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<StudentCountResponse>, ApiError> {
    let total = repo::count_students(&state.pool).map_err(ApiError::Database)?;

    Ok(Json(StudentCountResponse { total }))
}

/// Handler for student statistics under a search/status filter
///
/// This function handles GET requests to `/api/students/stats`. An
/// unknown `status` value matches nothing, mirroring a filter over an
/// enum column.
#[instrument(skip(state, _admin, query))]
pub async fn student_stats_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<StudentStatsQuery>,
) -> Result<Json<StudentStatsResponse>, ApiError> {
    let students =
        repo::list_students(&state.pool, query.search.as_deref()).map_err(ApiError::Database)?;

    let status_filter = query.status.as_deref().unwrap_or("all");
    let matching: Vec<&Student> = students
        .iter()
        .filter(|s| status_filter == "all" || s.get_current_status().as_str() == status_filter)
        .collect();

    let total = matching.len() as i64;
    let placed = matching
        .iter()
        .filter(|s| s.get_current_status() == PlacementStatus::Placed)
        .count() as i64;
    let not_placed = total - placed;
    let total_offers: i64 = matching.iter().map(|s| s.get_total_offers() as i64).sum();

    let avg_offers = if total > 0 {
        ((total_offers as f64 / total as f64) * 100.0).round() / 100.0
    } else {
        0.0
    };

    Ok(Json(StudentStatsResponse {
        total,
        placed,
        not_placed,
        total_offers,
        avg_offers,
    }))
}

/// Handler for retrieving a specific student
///
/// This function handles GET requests to `/api/students/{id}`.
#[instrument(skip(state, _admin), fields(student_id = %student_id))]
pub async fn get_student_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(student_id): Path<String>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = repo::get_student(&state.pool, &student_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("Student"))?;

    let applications =
        repo::applications_for_student(&state.pool, &student_id).map_err(ApiError::Database)?;

    Ok(Json(StudentResponse::from_student(&student, &applications)))
}

/// Handler for creating a student manually
///
/// This function handles POST requests to `/api/students`. Roll number
/// and email must be unique; conflicts name the clashing value.
#[instrument(skip(state, _admin, payload))]
pub async fn create_student_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<CreateStudentDto>,
) -> Result<(StatusCode, Json<StudentEnvelope>), ApiError> {
    let name = payload.name.unwrap_or_default().trim().to_string();
    let roll_number = payload.roll_number.unwrap_or_default().trim().to_string();
    let email = payload.email.unwrap_or_default().trim().to_string();

    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    if roll_number.is_empty() {
        return Err(ApiError::Validation("Roll number is required".to_string()));
    }
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required".to_string()));
    }
    if !email.contains('@') || !email.contains('.') {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    if repo::get_student_by_roll_number(&state.pool, &roll_number)
        .map_err(ApiError::Database)?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Student with roll number {roll_number} already exists"
        )));
    }
    if repo::get_student_by_email(&state.pool, &email)
        .map_err(ApiError::Database)?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Student with email {email} already exists"
        )));
    }

    let student = repo::create_student(&state.pool, name.clone(), roll_number, email)
        .map_err(ApiError::Database)?;

    Ok((
        StatusCode::CREATED,
        Json(StudentEnvelope {
            message: format!("Student \"{name}\" created successfully"),
            student: StudentResponse::from_student(&student, &[]),
        }),
    ))
}

/// Handler for deleting a student with cascading updates
///
/// This function handles DELETE requests to `/api/students/{id}`.
#[instrument(skip(state, _admin), fields(student_id = %student_id))]
pub async fn delete_student_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(student_id): Path<String>,
) -> Result<Json<DeleteStudentResponse>, ApiError> {
    let (student, summary) = repo::delete_student_cascade(&state.pool, &student_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("Student"))?;

    info!(
        "Deleted student {} ({} companies affected)",
        student.get_name(),
        summary.companies_affected
    );

    Ok(Json(DeleteStudentResponse {
        message: "Student deleted successfully".to_string(),
        student_id: student.get_id(),
        student_name: student.get_name(),
        cascading_updates: summary,
    }))
}
