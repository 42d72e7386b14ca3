use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

/// Represents one placement season's analytics
///
/// This struct maps directly to the `years` table, keyed by the season
/// year itself. The counters are maintained by the write paths and wound
/// back by the student deletion cascade; the per-company breakdown is
/// derived from `companies` at read time rather than stored.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::years)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Year {
    /// The season year, e.g. 2026
    year: i32,

    /// Number of drives run this season
    total_companies: i32,

    /// Number of final selections this season
    total_placed: i32,

    /// Number of distinct students who participated this season
    total_students_participated: i32,

    /// When these analytics were last updated
    updated_at: NaiveDateTime,
}

impl Year {
    /// Creates a fresh analytics row for a season with zeroed counters
    pub fn new(year: i32) -> Self {
        Self {
            year,
            total_companies: 0,
            total_placed: 0,
            total_students_participated: 0,
            updated_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the season year
    pub fn get_year(&self) -> i32 {
        self.year
    }

    /// Gets the number of drives run this season
    pub fn get_total_companies(&self) -> i32 {
        self.total_companies
    }

    /// Gets the number of final selections this season
    pub fn get_total_placed(&self) -> i32 {
        self.total_placed
    }

    /// Gets the number of participating students this season
    pub fn get_total_students_participated(&self) -> i32 {
        self.total_students_participated
    }

    /// Gets the last-update timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_new_zeroed() {
        let year = Year::new(2026);

        assert_eq!(year.get_year(), 2026);
        assert_eq!(year.get_total_companies(), 0);
        assert_eq!(year.get_total_placed(), 0);
        assert_eq!(year.get_total_students_participated(), 0);
    }
}
