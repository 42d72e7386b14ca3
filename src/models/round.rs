use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use super::JsonValue;

/// Represents one selection round within a drive
///
/// This struct maps directly to the `rounds` table. Rounds are ordered by
/// `round_number` within their drive.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::rounds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Round {
    /// Unique identifier for the round (UUID v4 as string)
    id: String,

    /// The drive this round belongs to
    company_id: String,

    /// Position of this round within the drive (1-based)
    round_number: i32,

    /// Human-readable name, e.g. "Online Test" or "HR Interview"
    name: String,

    /// When this round was created
    created_at: NaiveDateTime,
}

impl Round {
    /// Creates a new round for the given drive
    pub fn new(company_id: String, round_number: i32, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            company_id,
            round_number,
            name,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the round's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the drive this round belongs to
    pub fn get_company_id(&self) -> String {
        self.company_id.clone()
    }

    /// Gets the round's position within the drive
    pub fn get_round_number(&self) -> i32 {
        self.round_number
    }

    /// Gets the round's name
    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    /// Gets the round's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}

/// Represents one student's row in a round's sheet
///
/// The `data` column keeps the uploaded sheet's columns verbatim as JSON;
/// the schema only lifts out the student linkage needed for cascades.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::round_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RoundEntry {
    /// Unique identifier for the entry (UUID v4 as string)
    id: String,

    /// The round this entry belongs to
    round_id: String,

    /// The student this entry is about
    student_id: String,

    /// The sheet row, stored as JSON
    data: JsonValue,

    /// When this entry was created
    created_at: NaiveDateTime,
}

impl RoundEntry {
    /// Creates a new entry for the given round and student
    pub fn new(round_id: String, student_id: String, data: JsonValue) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            round_id,
            student_id,
            data,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the entry's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the round this entry belongs to
    pub fn get_round_id(&self) -> String {
        self.round_id.clone()
    }

    /// Gets the ID of the student this entry is about
    pub fn get_student_id(&self) -> String {
        self.student_id.clone()
    }

    /// Gets the entry's sheet data
    pub fn get_data(&self) -> JsonValue {
        self.data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_new() {
        let round = Round::new("company-1".to_string(), 2, "HR Interview".to_string());

        assert_eq!(round.get_company_id(), "company-1");
        assert_eq!(round.get_round_number(), 2);
        assert_eq!(round.get_name(), "HR Interview");
        assert!(Uuid::parse_str(&round.get_id()).is_ok());
    }

    #[test]
    fn test_round_entry_new() {
        let data: JsonValue = json!({"score": 87}).into();
        let entry = RoundEntry::new("round-1".to_string(), "student-1".to_string(), data.clone());

        assert_eq!(entry.get_round_id(), "round-1");
        assert_eq!(entry.get_student_id(), "student-1");
        assert_eq!(entry.get_data(), data);
    }
}
