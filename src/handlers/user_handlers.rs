use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::AppState;
use crate::auth::{self, AdminUser};
use crate::dto::{CreateUserDto, MessageResponse, UpdateUserRoleDto, UserEnvelope, UserResponse, UserSummary};
use crate::errors::ApiError;
use crate::models::Role;
use crate::repo;

/// Handler for listing all user accounts
///
/// This function handles GET requests to `/api/users`. Password hashes
/// and refresh tokens never appear in the response.
#[instrument(skip(state, _admin))]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repo::list_users(&state.pool).map_err(ApiError::Database)?;

    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// Handler for creating a user account
///
/// This function handles POST requests to `/api/users`. The role defaults
/// to `student` when omitted.
#[instrument(skip(state, _admin, payload))]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<CreateUserDto>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(ApiError::Validation("Username and password required".to_string()));
    };
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("Username and password required".to_string()));
    }

    let role = match payload.role.as_deref() {
        None => Role::Student,
        Some(raw) => {
            Role::from_str(raw).map_err(|_| ApiError::Validation("Invalid role".to_string()))?
        }
    };

    if repo::get_user_by_username(&state.pool, &username)
        .map_err(ApiError::Database)?
        .is_some()
    {
        return Err(ApiError::Validation("Username already exists".to_string()));
    }

    let password_hash = auth::hash_password(&password).map_err(ApiError::Database)?;
    let user = repo::create_user(&state.pool, username, password_hash, role)
        .map_err(ApiError::Database)?;

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User created successfully".to_string(),
            user: UserSummary::from(&user),
        }),
    ))
}

/// Handler for changing a user's role
///
/// This function handles PUT requests to `/api/users/{id}`.
#[instrument(skip(state, _admin, payload), fields(user_id = %user_id))]
pub async fn update_user_role_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRoleDto>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let role = payload
        .role
        .as_deref()
        .and_then(|raw| Role::from_str(raw).ok())
        .ok_or_else(|| ApiError::Validation("Invalid role".to_string()))?;

    let user = repo::get_user(&state.pool, &user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("User"))?;

    repo::update_user_role(&state.pool, &user_id, role).map_err(ApiError::Database)?;

    Ok(Json(UserEnvelope {
        message: "User updated successfully".to_string(),
        user: UserSummary {
            id: user_id,
            username: user.get_username(),
            role,
        },
    }))
}

/// Handler for deleting a user account
///
/// This function handles DELETE requests to `/api/users/{id}`. An admin
/// cannot delete their own account.
#[instrument(skip(state, admin), fields(user_id = %user_id))]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if user_id == admin.get_id() {
        return Err(ApiError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    let user = repo::get_user(&state.pool, &user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("User"))?;

    repo::delete_user(&state.pool, &user_id).map_err(ApiError::Database)?;

    info!("Admin {} deleted user {}", admin.get_username(), user.get_username());

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

/// Handler for resetting a user's password to the configured default
///
/// This function handles POST requests to `/api/users/{id}/reset-password`.
#[instrument(skip(state, _admin), fields(user_id = %user_id))]
pub async fn reset_user_password_handler(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = repo::get_user(&state.pool, &user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("User"))?;

    let password_hash =
        auth::hash_password(&state.default_reset_password).map_err(ApiError::Database)?;
    repo::update_user_password(&state.pool, &user_id, &password_hash)
        .map_err(ApiError::Database)?;

    info!("Password reset for user {}", user.get_username());

    Ok(Json(MessageResponse {
        message: format!(
            "Password for user {} reset to '{}'",
            user.get_username(),
            state.default_reset_password
        ),
    }))
}
