//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database (recommended for testing and small deployments only).
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host.
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer the LANTERN_METADATA__PASSWORD env var over
        /// storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// SSL mode for connections.
        ssl_mode: Option<PgSslMode>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

fn default_max_connections() -> u32 {
    10
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { .. } => Ok(()),
            MetadataConfig::Postgres {
                url,
                host,
                database,
                ..
            } => match (url.as_ref(), host.as_ref(), database.as_ref()) {
                (Some(_), _, _) => Ok(()),
                (None, Some(_), Some(_)) => Ok(()),
                (None, None, _) => {
                    Err("postgres config requires either 'url' or 'host' + 'database'".to_string())
                }
                (None, Some(_), None) => {
                    Err("postgres config requires 'database' when using individual fields"
                        .to_string())
                }
            },
        }
    }
}

/// Session and cookie configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session cookie name.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Mark the session cookie `Secure` (default: true; disable for local
    /// plain-HTTP development only).
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,
    /// Session time-to-live in seconds. Refreshed on every request
    /// (sliding expiry).
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Interval in seconds between sweeps of expired sessions.
    #[serde(default = "default_session_sweep_interval_secs")]
    pub session_sweep_interval_secs: u64,
    /// Email of the bootstrap master account, provisioned at startup.
    /// WARNING: Prefer the LANTERN_AUTH__MASTER_PASSWORD env var over
    /// storing the password in config.
    #[serde(default)]
    pub master_email: Option<String>,
    /// Password of the bootstrap master account.
    #[serde(default)]
    pub master_password: Option<String>,
}

fn default_cookie_name() -> String {
    "lantern_session".to_string()
}

fn default_cookie_secure() -> bool {
    true
}

fn default_session_ttl_secs() -> u64 {
    60 * 60 * 24 * 30 // 30 days
}

fn default_session_sweep_interval_secs() -> u64 {
    3600 // 1 hour
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_secure: default_cookie_secure(),
            session_ttl_secs: default_session_ttl_secs(),
            session_sweep_interval_secs: default_session_sweep_interval_secs(),
            master_email: None,
            master_password: None,
        }
    }
}

impl AuthConfig {
    /// Session TTL as a Duration.
    pub fn session_ttl(&self) -> Duration {
        let secs = i64::try_from(self.session_ttl_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs)
    }

    /// Sweep interval as a std Duration.
    pub fn session_sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_sweep_interval_secs)
    }

    /// Validate auth configuration for settings that would misbehave at
    /// runtime.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        if self.session_sweep_interval_secs == 0 {
            return Err("auth.session_sweep_interval_secs cannot be 0. \
                 This would cause a panic when creating the sweep timer. \
                 Use a value >= 1 second."
                .to_string());
        }

        if self.master_email.is_some() != self.master_password.is_some() {
            return Err(
                "auth.master_email and auth.master_password must be set together".to_string(),
            );
        }

        if self.session_ttl_secs < 60 {
            warnings.push(format!(
                "auth.session_ttl_secs={} is very short; users will be \
                 logged out almost immediately.",
                self.session_ttl_secs
            ));
        }

        if !self.cookie_secure {
            warnings.push(
                "auth.cookie_secure=false sends session cookies over plain HTTP. \
                 Only use this setting in local development."
                    .to_string(),
            );
        }

        Ok(warnings)
    }
}

/// CMS content configuration.
///
/// The CMS is a read-only collaborator. A missing `project_id` disables the
/// client entirely; content reads then degrade to empty results rather than
/// failing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// CMS project identifier. Absent means the client is disabled.
    #[serde(default)]
    pub project_id: Option<String>,
    /// CMS dataset name.
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// CMS API version (date-stamped).
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Override the CMS base URL (for tests and self-hosted mirrors).
    /// Defaults to the hosted API derived from `project_id`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Time-to-live in seconds for the category-name cache.
    #[serde(default = "default_category_ttl_secs")]
    pub category_ttl_secs: u64,
}

fn default_dataset() -> String {
    "production".to_string()
}

fn default_api_version() -> String {
    "2024-01-01".to_string()
}

fn default_category_ttl_secs() -> u64 {
    300 // 5 minutes
}

impl ContentConfig {
    /// Category cache TTL as a std Duration.
    pub fn category_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.category_ttl_secs)
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Session and cookie configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// CMS content configuration.
    #[serde(default)]
    pub content: ContentConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses SQLite metadata, an insecure cookie and a
    /// disabled CMS client.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            metadata: MetadataConfig::default(),
            auth: AuthConfig {
                cookie_secure: false,
                ..AuthConfig::default()
            },
            content: ContentConfig::default(),
        }
    }
}
