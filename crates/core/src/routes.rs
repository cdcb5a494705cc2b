//! Route constants for the application area.
//!
//! Centralized so the gate, the handlers, and the tests agree on the same
//! paths instead of hardcoding strings throughout the codebase.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Root of the protected application area. Everything under this prefix
/// requires a session (or a valid public access code).
pub const APP_ROOT: &str = "/egift365";

/// Login page.
pub const LOGIN: &str = "/auth/login";

/// Signup page.
pub const SIGNUP: &str = "/auth/signup";

/// OAuth callback. Always passes the gate; the session exchange happens
/// downstream.
pub const CALLBACK: &str = "/auth/callback";

/// Query-component encoding: everything except unreserved characters.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Check whether `path` is the given route or one of its descendants.
pub fn is_under(path: &str, root: &str) -> bool {
    path == root || path.starts_with(&format!("{root}/"))
}

/// Build the login URL that returns to `next` after a successful login.
pub fn login_redirect(next: &str) -> String {
    format!(
        "{LOGIN}?next={}",
        utf8_percent_encode(next, QUERY_COMPONENT)
    )
}

/// Build the login URL carrying an error message.
pub fn login_with_error(error: &str) -> String {
    format!(
        "{LOGIN}?error={}",
        utf8_percent_encode(error, QUERY_COMPONENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_under_matches_root_and_children() {
        assert!(is_under("/egift365", APP_ROOT));
        assert!(is_under("/egift365/stories/abc", APP_ROOT));
        assert!(!is_under("/egift365abc", APP_ROOT));
        assert!(!is_under("/other", APP_ROOT));
    }

    #[test]
    fn login_redirect_encodes_next() {
        let url = login_redirect("/egift365/concepts/my-slug");
        assert_eq!(url, "/auth/login?next=%2Fegift365%2Fconcepts%2Fmy-slug");
    }

    #[test]
    fn login_with_error_encodes_message() {
        let url = login_with_error("bad code");
        assert_eq!(url, "/auth/login?error=bad%20code");
    }
}
