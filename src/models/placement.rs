use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use super::JsonValue;

/// Represents a final selection of a student in a drive
///
/// This struct maps directly to the `placements` table; unique per
/// (company, student). The `data` column carries the offer details
/// (package, role, ...) as JSON.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::placements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Placement {
    /// Unique identifier for the placement (UUID v4 as string)
    id: String,

    /// The drive the student was selected in
    company_id: String,

    /// The selected student
    student_id: String,

    /// Offer details, stored as JSON
    data: JsonValue,

    /// When this placement was recorded
    created_at: NaiveDateTime,
}

impl Placement {
    /// Creates a new placement record
    pub fn new(company_id: String, student_id: String, data: JsonValue) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            company_id,
            student_id,
            data,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the placement's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the drive
    pub fn get_company_id(&self) -> String {
        self.company_id.clone()
    }

    /// Gets the ID of the selected student
    pub fn get_student_id(&self) -> String {
        self.student_id.clone()
    }

    /// Gets the offer details
    pub fn get_data(&self) -> JsonValue {
        self.data.clone()
    }

    /// Gets the record's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placement_new() {
        let data: JsonValue = json!({"package": "8 LPA"}).into();
        let placement =
            Placement::new("company-1".to_string(), "student-1".to_string(), data.clone());

        assert_eq!(placement.get_company_id(), "company-1");
        assert_eq!(placement.get_student_id(), "student-1");
        assert_eq!(placement.get_data(), data);
        assert!(Uuid::parse_str(&placement.get_id()).is_ok());
    }
}
