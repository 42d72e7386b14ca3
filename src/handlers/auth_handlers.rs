use axum::{Json, extract::State};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::AppState;
use crate::auth::{self, ACCESS_COOKIE, AuthUser, REFRESH_COOKIE};
use crate::dto::{
    ChangePasswordDto, LoginDto, LoginResponse, MessageResponse, RefreshResponse, UserSummary,
};
use crate::errors::ApiError;
use crate::repo;

/// Builds an auth cookie the way browsers need it for the cross-origin
/// frontends: HttpOnly, Secure, SameSite=None, scoped to the whole site.
fn auth_cookie(name: &'static str, value: String, max_age_secs: u64) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs as i64))
        .build()
}

/// Builds a cookie that clears the named auth cookie
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Handler for logging in
///
/// This function handles POST requests to `/api/auth/login`.
///
/// Verifies the credentials, mints both tokens, persists the refresh
/// token on the user row (invalidating any previous one), and sets both
/// tokens as cookies alongside the JSON body.
#[instrument(skip(state, jar, payload))]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginDto>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(ApiError::Validation("Username and password required".to_string()));
    };
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("Username and password required".to_string()));
    }

    let user = repo::get_user_by_username(&state.pool, &username)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !auth::verify_password(&password, &user.get_password_hash()).map_err(ApiError::Database)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = state
        .auth
        .generate_access_token(&user)
        .map_err(ApiError::Database)?;
    let refresh_token = state
        .auth
        .generate_refresh_token(&user.get_id())
        .map_err(ApiError::Database)?;

    repo::update_user_refresh_token(&state.pool, &user.get_id(), Some(&refresh_token))
        .map_err(ApiError::Database)?;

    info!("User {} logged in", user.get_username());

    let jar = jar
        .add(auth_cookie(
            ACCESS_COOKIE,
            access_token.clone(),
            state.auth.access_expiry_secs(),
        ))
        .add(auth_cookie(
            REFRESH_COOKIE,
            refresh_token.clone(),
            state.auth.refresh_expiry_secs(),
        ));

    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user: UserSummary::from(&user),
            access_token,
            refresh_token,
        }),
    ))
}

/// Handler for refreshing an access token
///
/// This function handles POST requests to `/api/auth/refresh`.
///
/// Reads the refresh token from its cookie, checks it against the token
/// persisted for the user (a re-login rotates the persisted one, so stale
/// tokens die here), and issues a fresh access token.
#[instrument(skip(state, jar))]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), ApiError> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| ApiError::Unauthorized("Refresh token missing".to_string()))?;

    let claims = state.auth.decode_refresh_token(&refresh_token)?;

    let user = repo::get_user(&state.pool, &claims.sub)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    if user.get_refresh_token().as_deref() != Some(refresh_token.as_str()) {
        return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
    }

    let access_token = state
        .auth
        .generate_access_token(&user)
        .map_err(ApiError::Database)?;

    debug!("Refreshed access token for user {}", user.get_username());

    let jar = jar.add(auth_cookie(
        ACCESS_COOKIE,
        access_token.clone(),
        state.auth.access_expiry_secs(),
    ));

    Ok((
        jar,
        Json(RefreshResponse {
            message: "Token refreshed".to_string(),
            access_token,
        }),
    ))
}

/// Handler for logging out
///
/// This function handles POST requests to `/api/auth/logout`.
///
/// Clears both auth cookies. Always succeeds, token or no token.
#[instrument(skip(jar))]
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar
        .add(removal_cookie(ACCESS_COOKIE))
        .add(removal_cookie(REFRESH_COOKIE));

    (
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Handler for changing the caller's own password
///
/// This function handles POST requests to `/api/auth/change-password`.
#[instrument(skip(state, current_user, payload))]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(current_user): AuthUser,
    Json(payload): Json<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(current_password), Some(new_password)) =
        (payload.current_password, payload.new_password)
    else {
        return Err(ApiError::Validation(
            "Current password and new password required".to_string(),
        ));
    };
    if current_password.is_empty() || new_password.is_empty() {
        return Err(ApiError::Validation(
            "Current password and new password required".to_string(),
        ));
    }

    if new_password.len() < 6 {
        return Err(ApiError::Validation(
            "New password must be at least 6 characters".to_string(),
        ));
    }

    if !auth::verify_password(&current_password, &current_user.get_password_hash())
        .map_err(ApiError::Database)?
    {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = auth::hash_password(&new_password).map_err(ApiError::Database)?;
    repo::update_user_password(&state.pool, &current_user.get_id(), &new_hash)
        .map_err(ApiError::Database)?;

    info!("User {} changed their password", current_user.get_username());

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Handler for introspecting the current session
///
/// This function handles GET requests to `/api/auth/me`.
#[instrument(skip(current_user))]
pub async fn me_handler(AuthUser(current_user): AuthUser) -> Json<UserSummary> {
    Json(UserSummary::from(&current_user))
}
