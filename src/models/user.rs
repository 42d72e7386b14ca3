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

/// The role attached to a user account
///
/// Stored as lowercase text in the database and serialized the same way on
/// the wire. Only `Admin` may reach the resource routes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role: {other}")),
        }
    }
}

impl FromSql<Text, Sqlite> for Role {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        Role::from_str(&text).map_err(Into::into)
    }
}

impl ToSql<Text, Sqlite> for Role {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str().to_owned());
        Ok(IsNull::No)
    }
}

/// Represents a user account
///
/// This struct maps directly to the `users` table. The password hash and
/// the persisted refresh token never leave the server: both are skipped
/// during serialization.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Unique identifier for the user (UUID v4 as string)
    id: String,

    /// Login name, unique across accounts
    username: String,

    /// Bcrypt hash of the password
    #[serde(skip_serializing)]
    password_hash: String,

    /// The account's role
    role: Role,

    /// The currently honored refresh token, if any
    #[serde(skip_serializing)]
    refresh_token: Option<String>,

    /// When this account was created
    created_at: NaiveDateTime,
}

impl User {
    /// Creates a new user account
    ///
    /// ### Arguments
    ///
    /// * `username` - The login name
    /// * `password_hash` - The bcrypt hash of the password (never the raw password)
    /// * `role` - The account's role
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            role,
            refresh_token: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the user's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the user's login name
    pub fn get_username(&self) -> String {
        self.username.clone()
    }

    /// Gets the bcrypt hash of the user's password
    pub fn get_password_hash(&self) -> String {
        self.password_hash.clone()
    }

    /// Gets the user's role
    pub fn get_role(&self) -> Role {
        self.role
    }

    /// Gets the refresh token currently persisted for the user
    pub fn get_refresh_token(&self) -> Option<String> {
        self.refresh_token.clone()
    }

    /// Gets the account's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}
