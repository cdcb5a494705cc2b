//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use lantern_content::ContentClient;
use lantern_core::SessionSecret;
use lantern_core::config::{AppConfig, MetadataConfig};
use lantern_metadata::models::{ProfileRow, ROLE_MASTER, ROLE_MEMBER, SessionRow};
use lantern_metadata::{MetadataStore, SqliteStore};
use lantern_server::{AppState, create_router};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server on a temporary SQLite store with the CMS
    /// client disabled.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("metadata.db");

        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create metadata store"),
        );

        let mut config = AppConfig::for_testing();
        config.metadata = MetadataConfig::Sqlite { path: db_path };

        let content =
            Arc::new(ContentClient::new(&config.content).expect("Failed to create CMS client"));

        let state = AppState::new(config, metadata, content);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata store.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Create a profile directly in the store and return its id.
    pub async fn create_profile(&self, email: &str, role: &str) -> Uuid {
        let now = OffsetDateTime::now_utc();
        let profile = ProfileRow {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: None,
            role: role.to_string(),
            avatar_url: None,
            password_hash: "unused".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.metadata()
            .create_profile(&profile)
            .await
            .expect("Failed to create profile");
        profile.user_id
    }

    /// Open a session for the user and return the raw cookie secret.
    pub async fn open_session(&self, user_id: Uuid) -> String {
        let secret = SessionSecret::generate();
        let now = OffsetDateTime::now_utc();
        let session = SessionRow {
            session_id: Uuid::new_v4(),
            token_hash: secret.hash(),
            user_id,
            created_at: now,
            refreshed_at: now,
            expires_at: now + self.state.config.auth.session_ttl(),
        };
        self.metadata()
            .create_session(&session)
            .await
            .expect("Failed to create session");
        secret.expose().to_string()
    }

    /// Create a signed-in member and return their session secret.
    pub async fn member_session(&self, email: &str) -> (Uuid, String) {
        let user_id = self.create_profile(email, ROLE_MEMBER).await;
        let secret = self.open_session(user_id).await;
        (user_id, secret)
    }

    /// Create a signed-in master and return their session secret.
    pub async fn master_session(&self, email: &str) -> (Uuid, String) {
        let user_id = self.create_profile(email, ROLE_MASTER).await;
        let secret = self.open_session(user_id).await;
        (user_id, secret)
    }

    /// Format a session secret as the Cookie header value.
    pub fn cookie(&self, secret: &str) -> String {
        format!("{}={}", self.state.config.auth.cookie_name, secret)
    }
}

/// Helper to make JSON requests, optionally with a session cookie.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
