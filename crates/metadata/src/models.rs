//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Public access tokens
// =============================================================================

/// Shareable bypass token granting public access to one path pattern.
#[derive(Debug, Clone, FromRow)]
pub struct AccessTokenRow {
    /// Globally unique shareable code.
    pub code: String,
    /// Path pattern the code unlocks (exact, `[slug]` segment, or `*` prefix).
    pub path: String,
    pub created_at: OffsetDateTime,
}

// =============================================================================
// Engagement
// =============================================================================

/// One user's like of one story. Unique on (story_slug, user_id).
#[derive(Debug, Clone, FromRow)]
pub struct LikeRow {
    pub like_id: Uuid,
    pub story_slug: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Denormalized per-story counters.
///
/// `likes` is kept equal to the authoritative `story_likes` count by
/// recomputing it inside the same transaction as every toggle. `reads` is
/// monotonically incremented, never decremented.
#[derive(Debug, Clone, FromRow)]
pub struct StoryStatsRow {
    pub story_slug: String,
    pub likes: i64,
    pub reads: i64,
    pub updated_at: OffsetDateTime,
}

/// One user's bookmark of one story. Primary key (user_id, story_slug).
#[derive(Debug, Clone, FromRow)]
pub struct BookmarkRow {
    pub user_id: Uuid,
    pub story_slug: String,
    pub created_at: OffsetDateTime,
}

// =============================================================================
// Profiles and sessions
// =============================================================================

/// User profile record.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    /// `member` for regular users, `master` for administrators.
    pub role: String,
    pub avatar_url: Option<String>,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// The administrative role name.
pub const ROLE_MASTER: &str = "master";

/// The default role for new profiles.
pub const ROLE_MEMBER: &str = "member";

impl ProfileRow {
    /// Whether this profile holds the administrative role.
    pub fn is_master(&self) -> bool {
        self.role == ROLE_MASTER
    }
}

/// Browser session record. The cookie carries the raw secret; only its
/// SHA-256 hash is stored here.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub session_id: Uuid,
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub refreshed_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl SessionRow {
    /// Whether the session is still valid at `now`.
    pub fn is_valid(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }
}
