use crate::auth;
use crate::db::DbPool;
use crate::models::{Role, User};
use crate::schema::users;
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument, warn};

/// Creates a new user account in the database
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `username` - The login name for the new account
/// * `password_hash` - The bcrypt hash of the password
/// * `role` - The account's role
///
/// ### Returns
///
/// A Result containing the newly created User if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails (including a duplicate username)
#[instrument(skip(pool, password_hash), fields(username = %username))]
pub fn create_user(
    pool: &DbPool,
    username: String,
    password_hash: String,
    role: Role,
) -> Result<User> {
    debug!("Creating new user");

    let conn = &mut pool.get()?;

    let new_user = User::new(username, password_hash, role);

    diesel::insert_into(users::table)
        .values(new_user.clone())
        .execute(conn)?;

    info!("Successfully created user with id: {}", new_user.get_id());

    Ok(new_user)
}

/// Retrieves a user from the database by their ID
#[instrument(skip(pool), fields(user_id = %id))]
pub fn get_user(pool: &DbPool, id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let result = users::table.find(id).first::<User>(conn).optional()?;

    Ok(result)
}

/// Retrieves a user from the database by their login name
#[instrument(skip(pool), fields(username = %username))]
pub fn get_user_by_username(pool: &DbPool, username: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let result = users::table
        .filter(users::username.eq(username))
        .first::<User>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves all users from the database
#[instrument(skip(pool))]
pub fn list_users(pool: &DbPool) -> Result<Vec<User>> {
    debug!("Listing all users");

    let conn = &mut pool.get()?;

    let result = users::table
        .order(users::created_at.asc())
        .load::<User>(conn)?;

    info!("Retrieved {} users", result.len());

    Ok(result)
}

/// Updates a user's role
#[instrument(skip(pool), fields(user_id = %id, role = %role))]
pub fn update_user_role(pool: &DbPool, id: &str, role: Role) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::update(users::table.find(id))
        .set(users::role.eq(role))
        .execute(conn)?;

    info!("Updated role for user {}", id);

    Ok(())
}

/// Replaces a user's password hash
#[instrument(skip(pool, password_hash), fields(user_id = %id))]
pub fn update_user_password(pool: &DbPool, id: &str, password_hash: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::update(users::table.find(id))
        .set(users::password_hash.eq(password_hash))
        .execute(conn)?;

    info!("Updated password for user {}", id);

    Ok(())
}

/// Replaces the refresh token persisted for a user
///
/// Passing `None` clears the token, invalidating any refresh token the
/// user still holds.
#[instrument(skip(pool, refresh_token), fields(user_id = %id))]
pub fn update_user_refresh_token(
    pool: &DbPool,
    id: &str,
    refresh_token: Option<&str>,
) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::update(users::table.find(id))
        .set(users::refresh_token.eq(refresh_token))
        .execute(conn)?;

    Ok(())
}

/// Deletes a user account
#[instrument(skip(pool), fields(user_id = %id))]
pub fn delete_user(pool: &DbPool, id: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::delete(users::table.find(id)).execute(conn)?;

    info!("Deleted user {}", id);

    Ok(())
}

/// Seeds the default admin account when the users table is empty
///
/// The service has always shipped with an `admin`/`admin` bootstrap
/// account so a fresh deployment can be logged into and locked down.
///
/// ### Returns
///
/// `true` when the account was created, `false` when users already exist
#[instrument(skip(pool))]
pub fn ensure_default_admin(pool: &DbPool) -> Result<bool> {
    let conn = &mut pool.get()?;

    let count: i64 = users::table.count().get_result(conn)?;
    if count > 0 {
        return Ok(false);
    }

    let password_hash = auth::hash_password("admin")?;
    let admin = User::new("admin".to_string(), password_hash, Role::Admin);

    diesel::insert_into(users::table)
        .values(admin.clone())
        .execute(conn)?;

    warn!("Seeded default admin account (username: admin). Change its password immediately.");

    Ok(true)
}
