use anyhow::Context;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::AppState;
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{Role, User};
use crate::repo;

/// Cookie carrying the access token for same-origin clients
pub const ACCESS_COOKIE: &str = "accessToken";

/// Cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// The user's ID
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// The user's ID
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material and lifetimes for both token kinds
///
/// Access and refresh tokens are HS256 JWTs signed with separate secrets,
/// so a leaked refresh secret cannot mint access tokens and vice versa.
pub struct AuthKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_expiry_secs: u64,
    refresh_expiry_secs: u64,
}

impl AuthKeys {
    /// Builds the keys from raw secrets and lifetimes
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_expiry_secs: u64,
        refresh_expiry_secs: u64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_expiry_secs,
            refresh_expiry_secs,
        }
    }

    /// Builds the keys from the resolved configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_refresh_secret,
            config.access_token_expiry_secs,
            config.refresh_token_expiry_secs,
        )
    }

    /// Gets the access token lifetime in seconds
    pub fn access_expiry_secs(&self) -> u64 {
        self.access_expiry_secs
    }

    /// Gets the refresh token lifetime in seconds
    pub fn refresh_expiry_secs(&self) -> u64 {
        self.refresh_expiry_secs
    }

    /// Mints an access token for the given user
    pub fn generate_access_token(&self, user: &User) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.get_id(),
            username: user.get_username(),
            role: user.get_role(),
            iat: now,
            exp: now + self.access_expiry_secs as i64,
        };
        encode(&Header::default(), &claims, &self.access_encoding)
            .context("failed to sign access token")
    }

    /// Mints a refresh token for the given user ID
    pub fn generate_refresh_token(&self, user_id: &str) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.refresh_expiry_secs as i64,
        };
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .context("failed to sign refresh token")
    }

    /// Verifies an access token and returns its claims
    ///
    /// ### Errors
    ///
    /// `Unauthorized` with "Token has expired" for an out-of-date token and
    /// "Invalid token" for anything else that fails validation.
    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims, ApiError> {
        // Token lifetimes are short; no clock leeway.
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<AccessClaims>(token, &self.access_decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Token has expired".to_string())
                }
                _ => ApiError::Unauthorized("Invalid token".to_string()),
            })
    }

    /// Verifies a refresh token and returns its claims
    pub fn decode_refresh_token(&self, token: &str) -> Result<RefreshClaims, ApiError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<RefreshClaims>(token, &self.refresh_decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Refresh token expired".to_string())
                }
                _ => ApiError::Unauthorized("Invalid refresh token".to_string()),
            })
    }
}

/// Hashes a raw password with bcrypt
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).context("failed to hash password")
}

/// Checks a raw password against a stored bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    bcrypt::verify(password, hash).context("failed to verify password")
}

/// Pulls the access token out of a request
///
/// The Authorization header is tried first (cross-origin clients), falling
/// back to the `accessToken` cookie (same-origin clients).
fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(ACCESS_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

/// Extractor for any authenticated user
///
/// Rejects with 401 when the token is missing, expired, malformed, or its
/// subject no longer resolves to a user row.
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)
            .ok_or_else(|| ApiError::Unauthorized("Token is missing".to_string()))?;

        let claims = state.auth.decode_access_token(&token)?;
        debug!("authenticated request for user {}", claims.sub);

        let user = repo::get_user(&state.pool, &claims.sub)
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser(user))
    }
}

/// Extractor for an authenticated admin
///
/// Builds on [`AuthUser`] and additionally rejects non-admin roles with 403.
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if user.get_role() != Role::Admin {
            return Err(ApiError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}
