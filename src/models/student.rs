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

/// Whether a student currently holds at least one final offer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    Placed,
    NotPlaced,
}

impl PlacementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStatus::Placed => "placed",
            PlacementStatus::NotPlaced => "not_placed",
        }
    }
}

impl fmt::Display for PlacementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(PlacementStatus::Placed),
            "not_placed" => Ok(PlacementStatus::NotPlaced),
            other => Err(format!("Invalid placement status: {other}")),
        }
    }
}

impl FromSql<Text, Sqlite> for PlacementStatus {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        PlacementStatus::from_str(&text).map_err(Into::into)
    }
}

impl ToSql<Text, Sqlite> for PlacementStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str().to_owned());
        Ok(IsNull::No)
    }
}

/// Represents a placement candidate
///
/// This struct maps directly to the `students` table. Per-company
/// participation lives in `applications`; this row carries the identity
/// fields and the aggregate placement state.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    /// Unique identifier for the student (UUID v4 as string)
    id: String,

    /// Full name
    name: String,

    /// College roll number, unique across students
    roll_number: String,

    /// Contact email, unique across students
    email: String,

    /// Whether the student currently holds a final offer
    current_status: PlacementStatus,

    /// Number of final offers across all drives
    total_offers: i32,

    /// When this record was created
    created_at: NaiveDateTime,

    /// When this record was last updated
    updated_at: NaiveDateTime,
}

impl Student {
    /// Creates a new student with no placements yet
    ///
    /// ### Arguments
    ///
    /// * `name` - The student's full name
    /// * `roll_number` - The unique roll number
    /// * `email` - The unique contact email
    pub fn new(name: String, roll_number: String, email: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            roll_number,
            email,
            current_status: PlacementStatus::NotPlaced,
            total_offers: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gets the student's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the student's name
    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    /// Gets the student's roll number
    pub fn get_roll_number(&self) -> String {
        self.roll_number.clone()
    }

    /// Gets the student's email
    pub fn get_email(&self) -> String {
        self.email.clone()
    }

    /// Gets the student's aggregate placement status
    pub fn get_current_status(&self) -> PlacementStatus {
        self.current_status
    }

    /// Gets the number of final offers the student holds
    pub fn get_total_offers(&self) -> i32 {
        self.total_offers
    }

    /// Gets the record's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Gets the record's last-update timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}
