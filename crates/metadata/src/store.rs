//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{AccessTokenRepo, BookmarkRepo, EngagementRepo, ProfileRepo, SessionRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    AccessTokenRepo + EngagementRepo + BookmarkRepo + ProfileRepo + SessionRepo + Send + Sync
{
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under test/axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement all the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use crate::repos::engagement::LikeToggle;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[async_trait]
    impl AccessTokenRepo for SqliteStore {
        async fn create_access_token(&self, token: &AccessTokenRow) -> MetadataResult<()> {
            if self.get_access_token(&token.code).await?.is_some() {
                return Err(MetadataError::AlreadyExists(format!(
                    "access token code '{}' already exists",
                    token.code
                )));
            }

            sqlx::query(
                "INSERT INTO public_access_tokens (code, path, created_at) VALUES (?, ?, ?)",
            )
            .bind(&token.code)
            .bind(&token.path)
            .bind(token.created_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_access_token(&self, code: &str) -> MetadataResult<Option<AccessTokenRow>> {
            let row = sqlx::query_as::<_, AccessTokenRow>(
                "SELECT * FROM public_access_tokens WHERE code = ?",
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
                "UPDATE public_access_tokens SET path = ? WHERE code = ? RETURNING *",
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
                sqlx::query_scalar("SELECT code FROM public_access_tokens WHERE code = ?")
                    .bind(new_code)
                    .fetch_optional(&mut *tx)
                    .await?;
            if taken.is_some() {
                return Err(MetadataError::AlreadyExists(format!(
                    "access token code '{new_code}' already exists"
                )));
            }

            let deleted = sqlx::query("DELETE FROM public_access_tokens WHERE code = ?")
                .bind(code)
                .execute(&mut *tx)
                .await?;
            if deleted.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "access token '{code}' not found"
                )));
            }

            let row = sqlx::query_as::<_, AccessTokenRow>(
                "INSERT INTO public_access_tokens (code, path, created_at) VALUES (?, ?, ?) RETURNING *",
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
            sqlx::query("DELETE FROM public_access_tokens WHERE code = ?")
                .bind(code)
                .execute(&self.pool)
                .await?;
            Ok(())
        }
    }

    #[async_trait]
    impl EngagementRepo for SqliteStore {
        async fn count_likes(&self, story_slug: &str) -> MetadataResult<i64> {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM story_likes WHERE story_slug = ?")
                    .bind(story_slug)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(count)
        }

        async fn is_liked(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<bool> {
            let row: Option<Uuid> = sqlx::query_scalar(
                "SELECT like_id FROM story_likes WHERE story_slug = ? AND user_id = ?",
            )
            .bind(story_slug)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.is_some())
        }

        async fn toggle_like(
            &self,
            story_slug: &str,
            user_id: Uuid,
        ) -> MetadataResult<LikeToggle> {
            let now = OffsetDateTime::now_utc();
            let mut tx = self.pool.begin().await?;

            let existing: Option<Uuid> = sqlx::query_scalar(
                "SELECT like_id FROM story_likes WHERE story_slug = ? AND user_id = ?",
            )
            .bind(story_slug)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

            match existing {
                Some(like_id) => {
                    sqlx::query("DELETE FROM story_likes WHERE like_id = ?")
                        .bind(like_id)
                        .execute(&mut *tx)
                        .await?;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO story_likes (like_id, story_slug, user_id, created_at) \
                         VALUES (?, ?, ?, ?)",
                    )
                    .bind(Uuid::new_v4())
                    .bind(story_slug)
                    .bind(user_id)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
            }

            // Recompute from the authoritative join table inside the same
            // transaction so the counter cannot diverge.
            let likes: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM story_likes WHERE story_slug = ?")
                    .bind(story_slug)
                    .fetch_one(&mut *tx)
                    .await?;

            sqlx::query(
                "INSERT INTO story_stats (story_slug, likes, reads, updated_at) \
                 VALUES (?, ?, 0, ?) \
                 ON CONFLICT(story_slug) DO UPDATE SET \
                 likes = excluded.likes, updated_at = excluded.updated_at",
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

        async fn get_story_stats(
            &self,
            story_slug: &str,
        ) -> MetadataResult<Option<StoryStatsRow>> {
            let row =
                sqlx::query_as::<_, StoryStatsRow>("SELECT * FROM story_stats WHERE story_slug = ?")
                    .bind(story_slug)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row)
        }

        async fn increment_reads(&self, story_slug: &str) -> MetadataResult<i64> {
            let reads: i64 = sqlx::query_scalar(
                "INSERT INTO story_stats (story_slug, likes, reads, updated_at) \
                 VALUES (?, 0, 1, ?) \
                 ON CONFLICT(story_slug) DO UPDATE SET \
                 reads = story_stats.reads + 1, updated_at = excluded.updated_at \
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
    impl BookmarkRepo for SqliteStore {
        async fn is_bookmarked(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<bool> {
            let row: Option<String> = sqlx::query_scalar(
                "SELECT story_slug FROM bookmarks WHERE user_id = ? AND story_slug = ?",
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
                "SELECT story_slug FROM bookmarks WHERE user_id = ? AND story_slug = ?",
            )
            .bind(user_id)
            .bind(story_slug)
            .fetch_optional(&mut *tx)
            .await?;

            if existing.is_some() {
                sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND story_slug = ?")
                    .bind(user_id)
                    .bind(story_slug)
                    .execute(&mut *tx)
                    .await?;
            } else {
                sqlx::query(
                    "INSERT INTO bookmarks (user_id, story_slug, created_at) VALUES (?, ?, ?)",
                )
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
                "SELECT story_slug FROM bookmarks WHERE user_id = ? ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(slugs)
        }
    }

    #[async_trait]
    impl ProfileRepo for SqliteStore {
        async fn create_profile(&self, profile: &ProfileRow) -> MetadataResult<()> {
            if self.get_profile_by_email(&profile.email).await?.is_some() {
                return Err(MetadataError::AlreadyExists(format!(
                    "profile with email '{}' already exists",
                    profile.email
                )));
            }

            sqlx::query(
                "INSERT INTO profiles \
                 (user_id, email, full_name, role, avatar_url, password_hash, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
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

        async fn get_profile(&self, user_id: Uuid) -> MetadataResult<Option<ProfileRow>> {
            let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_profile_by_email(&self, email: &str) -> MetadataResult<Option<ProfileRow>> {
            let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn ensure_profile(&self, profile: &ProfileRow) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO profiles \
                 (user_id, email, full_name, role, avatar_url, password_hash, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(user_id) DO NOTHING",
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
    impl SessionRepo for SqliteStore {
        async fn create_session(&self, session: &SessionRow) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO sessions \
                 (session_id, token_hash, user_id, created_at, refreshed_at, expires_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
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

        async fn get_session_by_hash(
            &self,
            token_hash: &str,
        ) -> MetadataResult<Option<SessionRow>> {
            let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE token_hash = ?")
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
            sqlx::query("UPDATE sessions SET refreshed_at = ?, expires_at = ? WHERE session_id = ?")
                .bind(refreshed_at)
                .bind(expires_at)
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn delete_session(&self, session_id: Uuid) -> MetadataResult<()> {
            sqlx::query("DELETE FROM sessions WHERE session_id = ?")
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn delete_expired_sessions(&self, now: OffsetDateTime) -> MetadataResult<u64> {
            let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                .bind(now)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }
    }
}

/// SQLite schema (applied idempotently on startup).
const SCHEMA_SQL: &str = r#"
-- Shareable public access tokens
CREATE TABLE IF NOT EXISTS public_access_tokens (
    code TEXT PRIMARY KEY,
    path TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_access_tokens_created ON public_access_tokens(created_at);

-- User profiles
CREATE TABLE IF NOT EXISTS profiles (
    user_id BLOB PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT,
    role TEXT NOT NULL DEFAULT 'member',
    avatar_url TEXT,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Browser sessions (cookie secret stored as SHA-256 hash)
CREATE TABLE IF NOT EXISTS sessions (
    session_id BLOB PRIMARY KEY,
    token_hash TEXT NOT NULL UNIQUE,
    user_id BLOB NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    refreshed_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

-- Likes: authoritative join table, unique per (story, user)
CREATE TABLE IF NOT EXISTS story_likes (
    like_id BLOB PRIMARY KEY,
    story_slug TEXT NOT NULL,
    user_id BLOB NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (story_slug, user_id)
);
CREATE INDEX IF NOT EXISTS idx_story_likes_slug ON story_likes(story_slug);

-- Denormalized per-story counters
CREATE TABLE IF NOT EXISTS story_stats (
    story_slug TEXT PRIMARY KEY,
    likes INTEGER NOT NULL DEFAULT 0,
    reads INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Bookmarks: join table, atomic toggles
CREATE TABLE IF NOT EXISTS bookmarks (
    user_id BLOB NOT NULL,
    story_slug TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, story_slug)
);
CREATE INDEX IF NOT EXISTS idx_bookmarks_user ON bookmarks(user_id, created_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    async fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let temp = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(temp.path().join("metadata.db"))
            .await
            .unwrap();
        (temp, store)
    }

    fn test_profile(email: &str) -> ProfileRow {
        let now = OffsetDateTime::now_utc();
        ProfileRow {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: None,
            role: ROLE_MEMBER.to_string(),
            avatar_url: None,
            password_hash: "x".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn toggle_like_twice_restores_count() {
        let (_temp, store) = test_store().await;
        let user = Uuid::new_v4();

        let first = store.toggle_like("s1", user).await.unwrap();
        assert!(first.is_liked);
        assert_eq!(first.likes, 1);

        let stats = store.get_story_stats("s1").await.unwrap().unwrap();
        assert_eq!(stats.likes, 1);

        let second = store.toggle_like("s1", user).await.unwrap();
        assert!(!second.is_liked);
        assert_eq!(second.likes, 0);

        let stats = store.get_story_stats("s1").await.unwrap().unwrap();
        assert_eq!(stats.likes, 0);
    }

    #[tokio::test]
    async fn counter_tracks_join_table_across_users() {
        let (_temp, store) = test_store().await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.toggle_like("s1", a).await.unwrap();
        let toggled = store.toggle_like("s1", b).await.unwrap();
        assert_eq!(toggled.likes, 2);
        assert_eq!(store.count_likes("s1").await.unwrap(), 2);
        assert!(store.is_liked("s1", a).await.unwrap());

        store.toggle_like("s1", a).await.unwrap();
        assert_eq!(store.count_likes("s1").await.unwrap(), 1);
        assert_eq!(
            store.get_story_stats("s1").await.unwrap().unwrap().likes,
            1
        );
    }

    #[tokio::test]
    async fn increment_reads_counts_sequentially() {
        let (_temp, store) = test_store().await;

        for expected in 1..=5 {
            let reads = store.increment_reads("fresh").await.unwrap();
            assert_eq!(reads, expected);
        }

        let stats = store.get_story_stats("fresh").await.unwrap().unwrap();
        assert_eq!(stats.reads, 5);
        assert_eq!(stats.likes, 0);
    }

    #[tokio::test]
    async fn zero_state_story_has_no_stats_row() {
        let (_temp, store) = test_store().await;
        assert!(store.get_story_stats("absent").await.unwrap().is_none());
        assert_eq!(store.count_likes("absent").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bookmark_toggle_alternates() {
        let (_temp, store) = test_store().await;
        let user = Uuid::new_v4();

        assert!(store.toggle_bookmark("s1", user).await.unwrap());
        assert!(store.is_bookmarked("s1", user).await.unwrap());
        assert!(!store.toggle_bookmark("s1", user).await.unwrap());
        assert!(!store.is_bookmarked("s1", user).await.unwrap());
    }

    #[tokio::test]
    async fn bookmarks_list_is_per_user() {
        let (_temp, store) = test_store().await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.toggle_bookmark("s1", a).await.unwrap();
        store.toggle_bookmark("s2", a).await.unwrap();
        store.toggle_bookmark("s1", b).await.unwrap();

        let mut list = store.list_bookmarks(a).await.unwrap();
        list.sort();
        assert_eq!(list, vec!["s1".to_string(), "s2".to_string()]);
        assert_eq!(store.list_bookmarks(b).await.unwrap(), vec!["s1"]);
    }

    #[tokio::test]
    async fn access_token_crud_round_trip() {
        let (_temp, store) = test_store().await;
        let token = AccessTokenRow {
            code: "abc123".to_string(),
            path: "/egift365/concepts/[slug]".to_string(),
            created_at: OffsetDateTime::now_utc(),
        };

        store.create_access_token(&token).await.unwrap();
        let fetched = store.get_access_token("abc123").await.unwrap().unwrap();
        assert_eq!(fetched.path, token.path);

        // Duplicate code is rejected
        let dup = store.create_access_token(&token).await;
        assert!(matches!(dup, Err(MetadataError::AlreadyExists(_))));

        let updated = store
            .update_access_token_path("abc123", "/egift365/*")
            .await
            .unwrap();
        assert_eq!(updated.path, "/egift365/*");

        store.delete_access_token("abc123").await.unwrap();
        assert!(store.get_access_token("abc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_access_token_moves_code() {
        let (_temp, store) = test_store().await;
        let token = AccessTokenRow {
            code: "old".to_string(),
            path: "/egift365/a".to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        store.create_access_token(&token).await.unwrap();

        let replaced = store
            .replace_access_token("old", "new", "/egift365/b")
            .await
            .unwrap();
        assert_eq!(replaced.code, "new");
        assert_eq!(replaced.path, "/egift365/b");
        assert!(store.get_access_token("old").await.unwrap().is_none());

        // Replacing onto a taken code fails and leaves both rows intact
        let other = AccessTokenRow {
            code: "taken".to_string(),
            path: "/egift365/c".to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        store.create_access_token(&other).await.unwrap();
        let conflict = store.replace_access_token("new", "taken", "/x").await;
        assert!(matches!(conflict, Err(MetadataError::AlreadyExists(_))));
        assert!(store.get_access_token("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn profile_duplicate_email_rejected() {
        let (_temp, store) = test_store().await;
        let profile = test_profile("a@example.com");
        store.create_profile(&profile).await.unwrap();

        let dup = test_profile("a@example.com");
        assert!(matches!(
            store.create_profile(&dup).await,
            Err(MetadataError::AlreadyExists(_))
        ));

        let by_email = store
            .get_profile_by_email("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.user_id, profile.user_id);
    }

    #[tokio::test]
    async fn ensure_profile_is_idempotent() {
        let (_temp, store) = test_store().await;
        let mut profile = test_profile("b@example.com");
        store.ensure_profile(&profile).await.unwrap();

        // A second ensure with different fields does not overwrite
        profile.role = ROLE_MASTER.to_string();
        store.ensure_profile(&profile).await.unwrap();

        let fetched = store.get_profile(profile.user_id).await.unwrap().unwrap();
        assert_eq!(fetched.role, ROLE_MEMBER);
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let (_temp, store) = test_store().await;
        let profile = test_profile("c@example.com");
        store.create_profile(&profile).await.unwrap();

        let now = OffsetDateTime::now_utc();
        let session = SessionRow {
            session_id: Uuid::new_v4(),
            token_hash: "hash-1".to_string(),
            user_id: profile.user_id,
            created_at: now,
            refreshed_at: now,
            expires_at: now + Duration::days(30),
        };
        store.create_session(&session).await.unwrap();

        let fetched = store
            .get_session_by_hash("hash-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.user_id, profile.user_id);
        assert!(fetched.is_valid(now));

        let later = now + Duration::hours(1);
        store
            .refresh_session(session.session_id, later, later + Duration::days(30))
            .await
            .unwrap();
        let refreshed = store
            .get_session_by_hash("hash-1")
            .await
            .unwrap()
            .unwrap();
        assert!(refreshed.expires_at > fetched.expires_at);

        store.delete_session(session.session_id).await.unwrap();
        assert!(store.get_session_by_hash("hash-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_swept() {
        let (_temp, store) = test_store().await;
        let profile = test_profile("d@example.com");
        store.create_profile(&profile).await.unwrap();

        let now = OffsetDateTime::now_utc();
        let expired = SessionRow {
            session_id: Uuid::new_v4(),
            token_hash: "hash-old".to_string(),
            user_id: profile.user_id,
            created_at: now - Duration::days(60),
            refreshed_at: now - Duration::days(60),
            expires_at: now - Duration::days(30),
        };
        let live = SessionRow {
            session_id: Uuid::new_v4(),
            token_hash: "hash-live".to_string(),
            user_id: profile.user_id,
            created_at: now,
            refreshed_at: now,
            expires_at: now + Duration::days(30),
        };
        store.create_session(&expired).await.unwrap();
        store.create_session(&live).await.unwrap();

        let removed = store.delete_expired_sessions(now).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store
            .get_session_by_hash("hash-old")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_session_by_hash("hash-live")
            .await
            .unwrap()
            .is_some());
    }
}
