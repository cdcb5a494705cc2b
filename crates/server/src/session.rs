//! Session cookie plumbing.
//!
//! The cookie carries an opaque random secret; the store holds its SHA-256
//! hash. Every authenticated request slides the session forward, and a
//! background task sweeps rows that expired anyway.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Response};
use lantern_core::SessionSecret;
use lantern_core::config::AuthConfig;
use lantern_metadata::models::{ProfileRow, SessionRow};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Resolved user identity for the current request, set by the access gate.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    /// Session row backing this request.
    pub session_id: Uuid,
    /// Profile id.
    pub user_id: Uuid,
    /// Profile role ("member" or "master").
    pub role: String,
}

impl CurrentUser {
    /// Whether this user holds the administrative role.
    pub fn is_master(&self) -> bool {
        self.role == lantern_metadata::models::ROLE_MASTER
    }
}

/// Extract a cookie value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Build the Set-Cookie value carrying a session secret.
pub fn session_cookie(config: &AuthConfig, secret: &SessionSecret) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name,
        secret.expose(),
        config.session_ttl_secs
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that expires the session cookie.
pub fn expired_cookie(config: &AuthConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Append a Set-Cookie header unless the handler already set one for the
/// session cookie (e.g. login issuing a fresh secret).
pub fn append_cookie_if_absent<B>(response: &mut Response<B>, config: &AuthConfig, value: &str) {
    let already_set = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&format!("{}=", config.cookie_name)));
    if already_set {
        return;
    }
    if let Ok(header) = HeaderValue::from_str(value) {
        response.headers_mut().append(SET_COOKIE, header);
    }
}

/// Authenticated request context: the session, its profile, and the raw
/// secret (needed to re-issue the cookie).
pub struct Authenticated {
    pub session: SessionRow,
    pub profile: ProfileRow,
    pub secret: SessionSecret,
}

impl Authenticated {
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            session_id: self.session.session_id,
            user_id: self.profile.user_id,
            role: self.profile.role.clone(),
        }
    }
}

/// Resolve the session cookie to a live session and its profile.
///
/// Malformed cookies, unknown secrets, and expired rows all resolve to
/// `None`; store failures are logged and treated as unauthenticated so the
/// gate fails closed.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<Authenticated> {
    let raw = cookie_value(headers, &state.config.auth.cookie_name)?;
    let secret = SessionSecret::parse(&raw).ok()?;

    let session = match state.metadata.get_session_by_hash(&secret.hash()).await {
        Ok(session) => session?,
        Err(err) => {
            tracing::warn!(error = %err, "session lookup failed");
            return None;
        }
    };

    if !session.is_valid(OffsetDateTime::now_utc()) {
        return None;
    }

    let profile = match state.metadata.get_profile(session.user_id).await {
        Ok(profile) => profile?,
        Err(err) => {
            tracing::warn!(error = %err, "profile lookup failed");
            return None;
        }
    };

    Some(Authenticated {
        session,
        profile,
        secret,
    })
}

/// Open a new session for the user and return the cookie secret.
pub async fn open_session(state: &AppState, user_id: Uuid) -> ApiResult<SessionSecret> {
    let secret = SessionSecret::generate();
    let now = OffsetDateTime::now_utc();
    let session = SessionRow {
        session_id: Uuid::new_v4(),
        token_hash: secret.hash(),
        user_id,
        created_at: now,
        refreshed_at: now,
        expires_at: now + state.config.auth.session_ttl(),
    };
    state
        .metadata
        .create_session(&session)
        .await
        .map_err(ApiError::from)?;
    Ok(secret)
}

/// Slide the session's expiry forward. Failures are logged, not fatal: the
/// session stays valid until its previous expiry.
pub async fn refresh(state: &AppState, session: &SessionRow) {
    let now = OffsetDateTime::now_utc();
    if let Err(err) = state
        .metadata
        .refresh_session(session.session_id, now, now + state.config.auth.session_ttl())
        .await
    {
        tracing::warn!(session_id = %session.session_id, error = %err, "session refresh failed");
    }
}

/// Spawn the periodic sweep of expired session rows.
pub fn spawn_sweeper(state: AppState) -> JoinHandle<()> {
    let interval = state.config.auth.session_sweep_interval();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            match state
                .metadata
                .delete_expired_sessions(OffsetDateTime::now_utc())
                .await
            {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "swept expired sessions"),
                Err(err) => tracing::warn!(error = %err, "session sweep failed"),
            }
        }
    })
}
