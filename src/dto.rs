use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{
    Application, Company, DriveStatus, PlacementStatus, Role, Student, SystemStats, User,
};
use crate::repo::CascadeSummary;

// All request and response bodies use camelCase keys; the shapes below are
// the service's published wire format.

/// Data transfer object for a login attempt
///
/// Fields are optional so that missing values surface as the endpoint's own
/// 400 message rather than a deserialization rejection.
#[derive(Deserialize, Debug)]
pub struct LoginDto {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Data transfer object for changing the caller's own password
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Data transfer object for creating a user account
#[derive(Deserialize, Debug)]
pub struct CreateUserDto {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Role name; defaults to "student". Kept as a string so unknown roles
    /// produce the endpoint's 400 rather than a deserialization rejection.
    pub role: Option<String>,
}

/// Data transfer object for changing a user's role
#[derive(Deserialize, Debug)]
pub struct UpdateUserRoleDto {
    pub role: Option<String>,
}

/// Data transfer object for creating a student
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentDto {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub email: Option<String>,
}

/// Query parameters for listing students
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ListStudentsQuery {
    /// Maximum number of students to return; all when unset
    pub limit: Option<i64>,
    /// Case-insensitive term matched against name, roll number and email
    pub search: Option<String>,
}

/// Query parameters for the student statistics endpoint
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct StudentStatsQuery {
    pub search: Option<String>,
    /// One of `all`, `placed`, `not_placed`; defaults to `all`
    pub status: Option<String>,
}

/// The user fields embedded in auth responses
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.get_id(),
            username: user.get_username(),
            role: user.get_role(),
        }
    }
}

/// Response body for a successful login
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

/// Response body for a successful token refresh
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub message: String,
    pub access_token: String,
}

/// Generic `{"message": ...}` response body
#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// A user as returned by the admin listing (no secrets)
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.get_id(),
            username: user.get_username(),
            role: user.get_role(),
            created_at: user.get_created_at(),
        }
    }
}

/// Response body wrapping a created or updated user
#[derive(Serialize, Deserialize, Debug)]
pub struct UserEnvelope {
    pub message: String,
    pub user: UserSummary,
}

/// One entry of a student's per-company participation map
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStatusEntry {
    pub year: i32,
    pub final_selection: bool,
}

/// A student as returned by the API, with participation derived from
/// the application rows
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub student_id: String,
    pub name: String,
    pub roll_number: String,
    pub email: String,
    pub current_status: PlacementStatus,
    pub total_offers: i32,
    pub company_status: BTreeMap<String, CompanyStatusEntry>,
    pub selected_companies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentResponse {
    /// Builds the wire representation of a student from its row and its
    /// application rows
    pub fn from_student(student: &Student, applications: &[Application]) -> Self {
        let mut company_status = BTreeMap::new();
        let mut selected_companies = Vec::new();

        for application in applications {
            company_status.insert(
                application.get_company_id(),
                CompanyStatusEntry {
                    year: application.get_year(),
                    final_selection: application.is_final_selection(),
                },
            );
            if application.is_final_selection() {
                selected_companies.push(application.get_company_id());
            }
        }

        Self {
            student_id: student.get_id(),
            name: student.get_name(),
            roll_number: student.get_roll_number(),
            email: student.get_email(),
            current_status: student.get_current_status(),
            total_offers: student.get_total_offers(),
            company_status,
            selected_companies,
            created_at: student.get_created_at(),
            updated_at: student.get_updated_at(),
        }
    }
}

/// Response body for the student listing
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StudentListResponse {
    pub students: Vec<StudentResponse>,
    pub total: i64,
    pub placed: i64,
    pub not_placed: i64,
    pub has_more: bool,
}

/// Response body for the student count endpoint
#[derive(Serialize, Deserialize, Debug)]
pub struct StudentCountResponse {
    pub total: i64,
}

/// Response body for the student statistics endpoint
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatsResponse {
    pub total: i64,
    pub placed: i64,
    pub not_placed: i64,
    pub total_offers: i64,
    pub avg_offers: f64,
}

/// Response body wrapping a newly created student
#[derive(Serialize, Deserialize, Debug)]
pub struct StudentEnvelope {
    pub message: String,
    pub student: StudentResponse,
}

/// Response body for a cascading student deletion
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStudentResponse {
    pub message: String,
    pub student_id: String,
    pub student_name: String,
    pub cascading_updates: CascadeSummary,
}

/// A company drive as returned by the API
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    pub company_year_id: String,
    pub company_name: String,
    pub year: i32,
    pub status: DriveStatus,
    pub total_applied: i32,
    pub total_placed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Company> for CompanyResponse {
    fn from(company: &Company) -> Self {
        Self {
            company_year_id: company.get_id(),
            company_name: company.get_company_name(),
            year: company.get_year(),
            status: company.get_status(),
            total_applied: company.get_total_applied(),
            total_placed: company.get_total_placed(),
            created_at: company.get_created_at(),
            updated_at: company.get_updated_at(),
        }
    }
}

/// A company drive with its placements keyed by student ID
#[derive(Serialize, Deserialize, Debug)]
pub struct CompanyDetailResponse {
    #[serde(flatten)]
    pub company: CompanyResponse,
    pub placements: BTreeMap<String, serde_json::Value>,
}

/// A selection round with its sheet rows keyed by entry ID
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    pub round_id: String,
    pub round_number: i32,
    pub name: String,
    pub data: BTreeMap<String, serde_json::Value>,
}

/// One company's contribution to a season's analytics
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyWiseEntry {
    pub company_name: String,
    pub placed: i32,
    pub status: DriveStatus,
}

/// A season's analytics as returned by the API
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct YearResponse {
    pub year: i32,
    pub total_companies: i32,
    pub total_placed: i32,
    pub total_students_participated: i32,
    pub company_wise: BTreeMap<String, CompanyWiseEntry>,
    pub updated_at: DateTime<Utc>,
}

/// The entity counts block of the dashboard summary
#[derive(Serialize, Deserialize, Debug)]
pub struct DashboardCounts {
    pub years: i32,
    pub companies: i32,
    pub students: i32,
}

/// The drive totals block of the dashboard summary
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_companies: i32,
    pub completed_companies: i32,
    pub running_companies: i32,
    pub total_placed: i32,
}

/// The most recent season as shown on the dashboard
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LatestYearSummary {
    pub year: i32,
    pub company_wise: BTreeMap<String, CompanyWiseEntry>,
    pub total_companies: i32,
    pub total_placed: i32,
}

/// Response body for the dashboard summary endpoint
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummaryResponse {
    pub counts: DashboardCounts,
    pub stats: DashboardStats,
    pub latest_year: LatestYearSummary,
    pub recent_companies: Vec<CompanyResponse>,
}

/// Response body for the stats initialization endpoint
#[derive(Serialize, Debug)]
pub struct InitializeStatsResponse {
    pub success: bool,
    pub message: String,
    pub stats: SystemStats,
}

/// Response body for the health check
#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
