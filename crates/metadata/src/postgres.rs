//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::*;
use crate::repos::{
    AccessTokenRepo, BookmarkRepo, EngagementRepo, ProfileRepo, SessionRepo, engagement::LikeToggle,
};
use crate::store::MetadataStore;
use async_trait::async_trait;
use lantern_core::config::PgSslMode;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(url: &str, max_connections: u32) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, enabling better
    /// secret management (e.g., passwords via environment variables).
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections).await
    }

    async fn connect(opts: PgConnectOptions, max_connections: u32) -> MetadataResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AccessTokenRepo for PostgresStore {
    async fn create_access_token(&self, token: &AccessTokenRow) -> MetadataResult<()> {
        let result = sqlx::query(
            "INSERT INTO public_access_tokens (code, path, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (code) DO NOTHING",
        )
        .bind(&token.code)
        .bind(&token.path)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MetadataError::AlreadyExists(format!(
                "access token code '{}' already exists",
                token.code
            )));
        }
        Ok(())
    }

    async fn get_access_token(&self, code: &str) -> MetadataResult<Option<AccessTokenRow>> {
        let row = sqlx::query_as::<_, AccessTokenRow>(
            "SELECT * FROM public_access_tokens WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_access_tokens(&self) -> MetadataResult<Vec<AccessTokenRow>> {
        let rows = sqlx::query_as::<_, AccessTokenRow>(
            "SELECT * FROM public_access_tokens ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_access_token_path(
        &self,
        code: &str,
        path: &str,
    ) -> MetadataResult<AccessTokenRow> {
        let row = sqlx::query_as::<_, AccessTokenRow>(
            "UPDATE public_access_tokens SET path = $1 WHERE code = $2 RETURNING *",
        )
        .bind(path)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| MetadataError::NotFound(format!("access token '{code}' not found")))
    }

    async fn replace_access_token(
        &self,
        code: &str,
        new_code: &str,
        path: &str,
    ) -> MetadataResult<AccessTokenRow> {
        let mut tx = self.pool.begin().await?;

        let taken: Option<String> =
            sqlx::query_scalar("SELECT code FROM public_access_tokens WHERE code = $1")
                .bind(new_code)
                .fetch_optional(&mut *tx)
                .await?;
        if taken.is_some() {
            return Err(MetadataError::AlreadyExists(format!(
                "access token code '{new_code}' already exists"
            )));
        }

        let deleted = sqlx::query("DELETE FROM public_access_tokens WHERE code = $1")
            .bind(code)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!(
                "access token '{code}' not found"
            )));
        }

        let row = sqlx::query_as::<_, AccessTokenRow>(
            "INSERT INTO public_access_tokens (code, path, created_at) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(new_code)
        .bind(path)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn delete_access_token(&self, code: &str) -> MetadataResult<()> {
        sqlx::query("DELETE FROM public_access_tokens WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EngagementRepo for PostgresStore {
    async fn count_likes(&self, story_slug: &str) -> MetadataResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM story_likes WHERE story_slug = $1")
                .bind(story_slug)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn is_liked(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<bool> {
        let row: Option<Uuid> = sqlx::query_scalar(
            "SELECT like_id FROM story_likes WHERE story_slug = $1 AND user_id = $2",
        )
        .bind(story_slug)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn toggle_like(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<LikeToggle> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT like_id FROM story_likes WHERE story_slug = $1 AND user_id = $2",
        )
        .bind(story_slug)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            Some(like_id) => {
                sqlx::query("DELETE FROM story_likes WHERE like_id = $1")
                    .bind(like_id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO story_likes (like_id, story_slug, user_id, created_at) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(Uuid::new_v4())
                .bind(story_slug)
                .bind(user_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }

        let likes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM story_likes WHERE story_slug = $1")
                .bind(story_slug)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            "INSERT INTO story_stats (story_slug, likes, reads, updated_at) \
             VALUES ($1, $2, 0, $3) \
             ON CONFLICT (story_slug) DO UPDATE SET \
             likes = EXCLUDED.likes, updated_at = EXCLUDED.updated_at",
        )
        .bind(story_slug)
        .bind(likes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LikeToggle {
            likes,
            is_liked: existing.is_none(),
        })
    }

    async fn get_story_stats(&self, story_slug: &str) -> MetadataResult<Option<StoryStatsRow>> {
        let row =
            sqlx::query_as::<_, StoryStatsRow>("SELECT * FROM story_stats WHERE story_slug = $1")
                .bind(story_slug)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn increment_reads(&self, story_slug: &str) -> MetadataResult<i64> {
        let reads: i64 = sqlx::query_scalar(
            "INSERT INTO story_stats (story_slug, likes, reads, updated_at) \
             VALUES ($1, 0, 1, $2) \
             ON CONFLICT (story_slug) DO UPDATE SET \
             reads = story_stats.reads + 1, updated_at = EXCLUDED.updated_at \
             RETURNING reads",
        )
        .bind(story_slug)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;
        Ok(reads)
    }
}

#[async_trait]
impl BookmarkRepo for PostgresStore {
    async fn is_bookmarked(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<bool> {
        let row: Option<String> = sqlx::query_scalar(
            "SELECT story_slug FROM bookmarks WHERE user_id = $1 AND story_slug = $2",
        )
        .bind(user_id)
        .bind(story_slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn toggle_bookmark(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<bool> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT story_slug FROM bookmarks WHERE user_id = $1 AND story_slug = $2",
        )
        .bind(user_id)
        .bind(story_slug)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND story_slug = $2")
                .bind(user_id)
                .bind(story_slug)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("INSERT INTO bookmarks (user_id, story_slug, created_at) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(story_slug)
                .bind(OffsetDateTime::now_utc())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(existing.is_none())
    }

    async fn list_bookmarks(&self, user_id: Uuid) -> MetadataResult<Vec<String>> {
        let slugs: Vec<String> = sqlx::query_scalar(
            "SELECT story_slug FROM bookmarks WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }
}

#[async_trait]
impl ProfileRepo for PostgresStore {
    async fn create_profile(&self, profile: &ProfileRow) -> MetadataResult<()> {
        let result = sqlx::query(
            "INSERT INTO profiles \
             (user_id, email, full_name, role, avatar_url, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.role)
        .bind(&profile.avatar_url)
        .bind(&profile.password_hash)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MetadataError::AlreadyExists(format!(
                "profile with email '{}' already exists",
                profile.email
            )));
        }
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> MetadataResult<Option<ProfileRow>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_profile_by_email(&self, email: &str) -> MetadataResult<Option<ProfileRow>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn ensure_profile(&self, profile: &ProfileRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO profiles \
             (user_id, email, full_name, role, avatar_url, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.role)
        .bind(&profile.avatar_url)
        .bind(&profile.password_hash)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepo for PostgresStore {
    async fn create_session(&self, session: &SessionRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO sessions \
             (session_id, token_hash, user_id, created_at, refreshed_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(session.session_id)
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.refreshed_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session_by_hash(&self, token_hash: &str) -> MetadataResult<Option<SessionRow>> {
        let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn refresh_session(
        &self,
        session_id: Uuid,
        refreshed_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> MetadataResult<()> {
        sqlx::query("UPDATE sessions SET refreshed_at = $1, expires_at = $2 WHERE session_id = $3")
            .bind(refreshed_at)
            .bind(expires_at)
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> MetadataResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> MetadataResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
