use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

/// Represents a student's participation in one drive
///
/// This struct maps directly to the `applications` table, keyed by
/// (student, company). `final_selection` flips to true when the student is
/// placed in that drive; the student's `selectedCompanies` list and
/// `companyStatus` map on the wire are both derived from these rows.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::applications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Application {
    /// The participating student
    student_id: String,

    /// The drive applied to
    company_id: String,

    /// The drive's season year, denormalized for per-year rollups
    year: i32,

    /// Whether the student was finally selected in this drive
    final_selection: bool,

    /// When this application was recorded
    created_at: NaiveDateTime,
}

impl Application {
    /// Creates a new application with no final selection yet
    pub fn new(student_id: String, company_id: String, year: i32) -> Self {
        Self {
            student_id,
            company_id,
            year,
            final_selection: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the ID of the participating student
    pub fn get_student_id(&self) -> String {
        self.student_id.clone()
    }

    /// Gets the ID of the drive applied to
    pub fn get_company_id(&self) -> String {
        self.company_id.clone()
    }

    /// Gets the drive's season year
    pub fn get_year(&self) -> i32 {
        self.year
    }

    /// Whether the student was finally selected in this drive
    pub fn is_final_selection(&self) -> bool {
        self.final_selection
    }

    /// Gets the record's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}
