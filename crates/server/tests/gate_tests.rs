//! Integration tests for the access gate.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::TestServer;
use lantern_core::SessionSecret;
use lantern_metadata::models::{AccessTokenRow, SessionRow};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

async fn get(server: &TestServer, uri: &str, cookie: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    server
        .router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn create_token(server: &TestServer, code: &str, path: &str) {
    server
        .metadata()
        .create_access_token(&AccessTokenRow {
            code: code.to_string(),
            path: path.to_string(),
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn protected_path_redirects_to_login_with_next() {
    let server = TestServer::new().await;

    let response = get(&server, "/egift365/concepts/my-slug", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/auth/login?next=%2Fegift365%2Fconcepts%2Fmy-slug"
    );
}

#[tokio::test]
async fn valid_code_opens_the_matching_path() {
    let server = TestServer::new().await;
    create_token(&server, "sharedcode", "/egift365/concepts/[slug]").await;

    // Passes the gate; no page handler exists, so the router falls through
    // to 404 instead of redirecting.
    let response = get(&server, "/egift365/concepts/inner-light?code=sharedcode", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn code_only_opens_paths_matching_its_pattern() {
    let server = TestServer::new().await;
    create_token(&server, "sharedcode", "/egift365/concepts/[slug]").await;

    let response = get(&server, "/egift365/stories/other?code=sharedcode", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Dynamic segment matches exactly one level
    let response = get(
        &server,
        "/egift365/concepts/inner-light/extra?code=sharedcode",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn unknown_code_behaves_like_no_code() {
    let server = TestServer::new().await;

    let response = get(&server, "/egift365/concepts/x?code=nosuchcode", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Fegift365%2Fconcepts%2Fx");
}

#[tokio::test]
async fn wildcard_token_opens_the_whole_subtree() {
    let server = TestServer::new().await;
    create_token(&server, "treecode", "/egift365/*").await;

    let response = get(&server, "/egift365/stories/a/b/c?code=treecode", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_opens_protected_paths_and_slides_forward() {
    let server = TestServer::new().await;
    let user_id = server
        .create_profile("reader@example.com", lantern_metadata::models::ROLE_MEMBER)
        .await;

    // Session nearing expiry: the gate should slide it forward.
    let secret = SessionSecret::generate();
    let now = OffsetDateTime::now_utc();
    server
        .metadata()
        .create_session(&SessionRow {
            session_id: Uuid::new_v4(),
            token_hash: secret.hash(),
            user_id,
            created_at: now - Duration::days(29),
            refreshed_at: now - Duration::days(29),
            expires_at: now + Duration::days(1),
        })
        .await
        .unwrap();

    let cookie = server.cookie(secret.expose());
    let response = get(&server, "/egift365/concepts/x", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Cookie is re-issued on the response
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.starts_with("lantern_session="));

    // Expiry moved forward in the store
    let refreshed = server
        .metadata()
        .get_session_by_hash(&secret.hash())
        .await
        .unwrap()
        .unwrap();
    assert!(refreshed.expires_at > now + Duration::days(20));
}

#[tokio::test]
async fn expired_session_does_not_open_protected_paths() {
    let server = TestServer::new().await;
    let user_id = server
        .create_profile("reader@example.com", lantern_metadata::models::ROLE_MEMBER)
        .await;

    let secret = SessionSecret::generate();
    let now = OffsetDateTime::now_utc();
    server
        .metadata()
        .create_session(&SessionRow {
            session_id: Uuid::new_v4(),
            token_hash: secret.hash(),
            user_id,
            created_at: now - Duration::days(60),
            refreshed_at: now - Duration::days(60),
            expires_at: now - Duration::days(30),
        })
        .await
        .unwrap();

    let cookie = server.cookie(secret.expose());
    let response = get(&server, "/egift365/concepts/x", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn visiting_login_signs_out_a_live_session() {
    let server = TestServer::new().await;
    let (_user, secret) = server.member_session("reader@example.com").await;
    let cookie = server.cookie(&secret);

    let response = get(&server, "/auth/login", Some(&cookie)).await;

    // The gate expires the cookie on the way out
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    // And the session row is gone
    let parsed = SessionSecret::parse(&secret).unwrap();
    assert!(
        server
            .metadata()
            .get_session_by_hash(&parsed.hash())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn public_routes_pass_without_session() {
    let server = TestServer::new().await;

    let response = get(&server, "/api/stories/any/stats", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&server, "/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn signed_out_session_is_rejected_afterwards() {
    let server = TestServer::new().await;
    let (_user, secret) = server.member_session("reader@example.com").await;
    let cookie = server.cookie(&secret);

    // Like works while signed in
    let (status, _) = common::json_request(
        &server.router,
        "POST",
        "/api/stories/s1/stats",
        Some(json!({"type": "like"})),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Visiting the login page signs out
    get(&server, "/auth/login", Some(&cookie)).await;

    let (status, _) = common::json_request(
        &server.router,
        "POST",
        "/api/stories/s1/stats",
        Some(json!({"type": "like"})),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
