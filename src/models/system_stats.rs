use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

/// The id of the single `system_stats` row
pub const SYSTEM_STATS_ROW: i32 = 1;

/// Pre-aggregated totals backing the dashboard summary
///
/// A single row (id = 1) that answers the dashboard's count queries
/// without scanning the base tables. `initialize` recomputes it from
/// scratch; the incremental helpers keep it current and never let a
/// counter go below zero.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::system_stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    #[serde(skip_serializing)]
    id: i32,
    total_years: i32,
    total_companies: i32,
    completed_companies: i32,
    running_companies: i32,
    total_students: i32,
    total_placed: i32,
    total_not_placed: i32,
    total_offers: i32,
    last_updated: Option<NaiveDateTime>,
}

impl SystemStats {
    /// An all-zero summary, used when the row has never been initialized
    pub fn empty() -> Self {
        Self {
            id: SYSTEM_STATS_ROW,
            total_years: 0,
            total_companies: 0,
            completed_companies: 0,
            running_companies: 0,
            total_students: 0,
            total_placed: 0,
            total_not_placed: 0,
            total_offers: 0,
            last_updated: None,
        }
    }

    /// Builds a fully-specified summary row
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        total_years: i32,
        total_companies: i32,
        completed_companies: i32,
        running_companies: i32,
        total_students: i32,
        total_placed: i32,
        total_not_placed: i32,
        total_offers: i32,
        last_updated: NaiveDateTime,
    ) -> Self {
        Self {
            id: SYSTEM_STATS_ROW,
            total_years,
            total_companies,
            completed_companies,
            running_companies,
            total_students,
            total_placed,
            total_not_placed,
            total_offers,
            last_updated: Some(last_updated),
        }
    }

    pub fn get_total_years(&self) -> i32 {
        self.total_years
    }

    pub fn get_total_companies(&self) -> i32 {
        self.total_companies
    }

    pub fn get_completed_companies(&self) -> i32 {
        self.completed_companies
    }

    pub fn get_running_companies(&self) -> i32 {
        self.running_companies
    }

    pub fn get_total_students(&self) -> i32 {
        self.total_students
    }

    pub fn get_total_placed(&self) -> i32 {
        self.total_placed
    }

    pub fn get_total_not_placed(&self) -> i32 {
        self.total_not_placed
    }

    pub fn get_total_offers(&self) -> i32 {
        self.total_offers
    }

    pub fn get_last_updated(&self) -> Option<NaiveDateTime> {
        self.last_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zeroed() {
        let stats = SystemStats::empty();
        assert_eq!(stats.get_total_students(), 0);
        assert_eq!(stats.get_total_companies(), 0);
        assert_eq!(stats.get_last_updated(), None);
    }

    #[test]
    fn test_serialization_is_camel_case() {
        let json = serde_json::to_value(SystemStats::empty()).unwrap();
        assert!(json.get("totalStudents").is_some());
        assert!(json.get("completedCompanies").is_some());
        assert!(json.get("id").is_none());
    }
}
