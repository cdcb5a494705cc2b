//! Request-time access gate.
//!
//! Classifies every request before routing: the OAuth callback passes,
//! login/signup discard any live session, the protected application area
//! requires a session or a valid shared access code, everything else passes
//! through. The gate also resolves the current user into request extensions
//! and slides the session cookie forward.

use crate::session::{self, Authenticated};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use lantern_core::PathPattern;
use lantern_core::routes;

/// Paths served without gate involvement (assets, health probes).
fn is_exempt(path: &str) -> bool {
    path == "/favicon.ico"
        || path.starts_with("/assets/")
        || path.starts_with("/_next/")
        || path == "/api/health"
}

/// Extract a query parameter from the raw query string. Access codes are
/// URL-safe by construction, so no percent-decoding is needed.
fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}

/// Whether a shared access code grants anonymous access to `path`.
async fn code_grants_access(state: &AppState, code: &str, path: &str) -> bool {
    let token = match state.metadata.get_access_token(code).await {
        Ok(Some(token)) => token,
        Ok(None) => return false,
        Err(err) => {
            // Fail closed: a store error falls through to the session check.
            tracing::warn!(error = %err, "access token lookup failed");
            return false;
        }
    };

    match PathPattern::parse(&token.path) {
        Ok(pattern) => pattern.matches(path),
        Err(err) => {
            tracing::warn!(code, error = %err, "stored access token has invalid pattern");
            false
        }
    }
}

/// Run the inner service with the user context attached, then slide the
/// session cookie forward on the response.
async fn run_authenticated(
    state: &AppState,
    auth: Authenticated,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().insert(auth.current_user());
    session::refresh(state, &auth.session).await;

    let mut response = next.run(req).await;
    let cookie = session::session_cookie(&state.config.auth, &auth.secret);
    session::append_cookie_if_absent(&mut response, &state.config.auth, &cookie);
    response
}

/// The access gate middleware.
pub async fn access_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    if is_exempt(&path) {
        return next.run(req).await;
    }

    let auth = session::authenticate(&state, req.headers()).await;

    // Callback always passes; the handler validates the session itself.
    if path == routes::CALLBACK {
        return match auth {
            Some(auth) => run_authenticated(&state, auth, req, next).await,
            None => next.run(req).await,
        };
    }

    // Visiting login or signup while authenticated signs the user out.
    if path == routes::LOGIN || path == routes::SIGNUP {
        if let Some(auth) = auth {
            if let Err(err) = state.metadata.delete_session(auth.session.session_id).await {
                tracing::warn!(error = %err, "sign-out on login page failed");
            }
            let mut response = next.run(req).await;
            let expired = session::expired_cookie(&state.config.auth);
            session::append_cookie_if_absent(&mut response, &state.config.auth, &expired);
            return response;
        }
        return next.run(req).await;
    }

    if routes::is_under(&path, routes::APP_ROOT) {
        // A valid shared code opens the matching path without a session.
        // An unknown or mismatched code falls through silently.
        if let Some(code) = query_param(req.uri().query(), "code") {
            if code_grants_access(&state, code, &path).await {
                return next.run(req).await;
            }
        }

        return match auth {
            Some(auth) => run_authenticated(&state, auth, req, next).await,
            None => Redirect::to(&routes::login_redirect(&path)).into_response(),
        };
    }

    // Public routes pass through, keeping the user context when present.
    match auth {
        Some(auth) => run_authenticated(&state, auth, req, next).await,
        None => next.run(req).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_picks_named_value() {
        assert_eq!(query_param(Some("code=abc&x=1"), "code"), Some("abc"));
        assert_eq!(query_param(Some("x=1&code=abc"), "code"), Some("abc"));
        assert_eq!(query_param(Some("code="), "code"), None);
        assert_eq!(query_param(Some("other=1"), "code"), None);
        assert_eq!(query_param(None, "code"), None);
    }

    #[test]
    fn exempt_paths_skip_the_gate() {
        assert!(is_exempt("/favicon.ico"));
        assert!(is_exempt("/assets/app.css"));
        assert!(is_exempt("/api/health"));
        assert!(!is_exempt("/egift365"));
        assert!(!is_exempt("/api/stories/x/stats"));
    }
}
