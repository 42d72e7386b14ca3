use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Whether a company's drive is still in progress
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum DriveStatus {
    Running,
    Completed,
}

impl DriveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveStatus::Running => "running",
            DriveStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for DriveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(DriveStatus::Running),
            "completed" => Ok(DriveStatus::Completed),
            other => Err(format!("Invalid drive status: {other}")),
        }
    }
}

impl FromSql<Text, Sqlite> for DriveStatus {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        DriveStatus::from_str(&text).map_err(Into::into)
    }
}

impl ToSql<Text, Sqlite> for DriveStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str().to_owned());
        Ok(IsNull::No)
    }
}

/// Represents one company's placement drive in one season
///
/// This struct maps directly to the `companies` table. The row's id is the
/// company-year identifier (`companyYearId`) the API exposes; the same
/// company recruiting across two seasons appears as two rows. The applied
/// and placed counters are denormalized and maintained by the write paths.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::companies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Company {
    /// Unique identifier for the drive (UUID v4 as string)
    id: String,

    /// The recruiting company's name
    company_name: String,

    /// The placement season this drive belongs to
    year: i32,

    /// Whether the drive is still in progress
    status: DriveStatus,

    /// Number of students who applied to this drive
    total_applied: i32,

    /// Number of students finally selected in this drive
    total_placed: i32,

    /// When this drive was created
    created_at: NaiveDateTime,

    /// When this drive was last updated
    updated_at: NaiveDateTime,
}

impl Company {
    /// Creates a new drive in the running state with zeroed counters
    pub fn new(company_name: String, year: i32) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            company_name,
            year,
            status: DriveStatus::Running,
            total_applied: 0,
            total_placed: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the drive's company-year ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the company's name
    pub fn get_company_name(&self) -> String {
        self.company_name.clone()
    }

    /// Gets the drive's season year
    pub fn get_year(&self) -> i32 {
        self.year
    }

    /// Gets the drive's status
    pub fn get_status(&self) -> DriveStatus {
        self.status
    }

    /// Sets the drive's status
    pub fn set_status(&mut self, status: DriveStatus) {
        self.status = status;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Gets the number of students who applied
    pub fn get_total_applied(&self) -> i32 {
        self.total_applied
    }

    /// Gets the number of students finally selected
    pub fn get_total_placed(&self) -> i32 {
        self.total_placed
    }

    /// Gets the drive's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Gets the drive's last-update timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_new_defaults() {
        let company = Company::new("Vertex Systems".to_string(), 2026);

        assert_eq!(company.get_status(), DriveStatus::Running);
        assert_eq!(company.get_total_applied(), 0);
        assert_eq!(company.get_total_placed(), 0);
        assert_eq!(company.get_year(), 2026);
        assert!(Uuid::parse_str(&company.get_id()).is_ok());
    }

    #[test]
    fn test_set_status_touches_updated_at() {
        let mut company = Company::new("Vertex Systems".to_string(), 2026);
        let before = company.get_updated_at();
        company.set_status(DriveStatus::Completed);

        assert_eq!(company.get_status(), DriveStatus::Completed);
        assert!(company.get_updated_at() >= before);
    }

    #[test]
    fn test_drive_status_round_trip() {
        for status in [DriveStatus::Running, DriveStatus::Completed] {
            assert_eq!(DriveStatus::from_str(status.as_str()).unwrap(), status);
        }
    }
}
