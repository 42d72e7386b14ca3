use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

/// Represents a JSON value stored in a TEXT column
///
/// Round sheets and placement records carry free-form per-student data
/// (the columns of an uploaded drive sheet), which is kept as JSON rather
/// than widened into the relational schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct JsonValue(pub serde_json::Value);

impl Default for JsonValue {
    fn default() -> Self {
        JsonValue(serde_json::Value::Null)
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(value: serde_json::Value) -> Self {
        JsonValue(value)
    }
}

impl FromSql<Text, Sqlite> for JsonValue {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        let value = serde_json::from_str(&text)?;
        Ok(JsonValue(value))
    }
}

impl ToSql<Text, Sqlite> for JsonValue {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(serde_json::to_string(&self.0)?);
        Ok(IsNull::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_null() {
        assert_eq!(JsonValue::default().0, serde_json::Value::Null);
    }

    #[test]
    fn test_from_value() {
        let value = json!({"package": "12 LPA"});
        let wrapped: JsonValue = value.clone().into();
        assert_eq!(wrapped.0, value);
    }
}
