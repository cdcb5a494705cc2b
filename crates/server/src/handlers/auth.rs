//! First-party auth endpoints: signup, login, logout, and the OAuth
//! callback landing.

use crate::error::{ApiError, ApiResult};
use crate::session::{self, CurrentUser};
use crate::state::AppState;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use lantern_core::routes;
use lantern_metadata::models::{ProfileRow, ROLE_MEMBER};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
}

impl From<ProfileRow> for UserResponse {
    fn from(profile: ProfileRow) -> Self {
        Self {
            id: profile.user_id,
            email: profile.email,
            full_name: profile.full_name,
            role: profile.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub next: Option<String>,
}

fn normalize_email(email: &str) -> ApiResult<String> {
    let email = email.trim().to_ascii_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ApiError::BadRequest("invalid email address".to_string()));
    }
    Ok(email)
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Open a session for the profile and build the JSON response with the
/// session cookie attached.
async fn respond_with_session(
    state: &AppState,
    status: StatusCode,
    profile: ProfileRow,
) -> ApiResult<Response> {
    let secret = session::open_session(state, profile.user_id).await?;
    let cookie = session::session_cookie(&state.config.auth, &secret);
    Ok((
        status,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "user": UserResponse::from(profile) })),
    )
        .into_response())
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<Response> {
    let email = normalize_email(&body.email)?;
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let now = OffsetDateTime::now_utc();
    let profile = ProfileRow {
        user_id: Uuid::new_v4(),
        email,
        full_name: body.full_name.filter(|name| !name.trim().is_empty()),
        role: ROLE_MEMBER.to_string(),
        avatar_url: None,
        password_hash: hash_password(&body.password)?,
        created_at: now,
        updated_at: now,
    };

    // Duplicate email surfaces as AlreadyExists, mapped to 400.
    state.metadata.create_profile(&profile).await?;
    tracing::info!(user_id = %profile.user_id, "profile created");

    respond_with_session(&state, StatusCode::CREATED, profile).await
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    let email = normalize_email(&body.email)?;
    let profile = state.metadata.get_profile_by_email(&email).await?;

    // One uniform rejection for unknown email and wrong password.
    let authenticated = profile
        .filter(|profile| verify_password(&body.password, &profile.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("invalid email or password".to_string()))?;

    respond_with_session(&state, StatusCode::OK, authenticated).await
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Response> {
    if let Some(Extension(user)) = user {
        state.metadata.delete_session(user.session_id).await?;
    }
    let expired = session::expired_cookie(&state.config.auth);
    Ok((
        AppendHeaders([(SET_COOKIE, expired)]),
        Json(json!({ "success": true })),
    )
        .into_response())
}

/// GET /auth/callback
///
/// Landing route after an external sign-in. With a live session it verifies
/// the profile and continues into the app; without one it bounces back to
/// login carrying an error.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    user: Option<Extension<CurrentUser>>,
) -> ApiResult<Response> {
    let Some(Extension(user)) = user else {
        return Ok(Redirect::to(&routes::login_with_error("callback without session")).into_response());
    };

    if state.metadata.get_profile(user.user_id).await?.is_none() {
        tracing::warn!(user_id = %user.user_id, "callback session has no profile");
        return Ok(Redirect::to(&routes::login_with_error("profile missing")).into_response());
    }

    // `next` must stay on this site; external URLs fall back to the app root.
    let next = query
        .next
        .as_deref()
        .filter(|next| next.starts_with('/') && !next.starts_with("//"))
        .unwrap_or(routes::APP_ROOT);
    Ok(Redirect::to(next).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(
            normalize_email("  User@Example.COM ").unwrap(),
            "user@example.com"
        );
        assert!(normalize_email("nodomain").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("user@tld").is_err());
    }
}
