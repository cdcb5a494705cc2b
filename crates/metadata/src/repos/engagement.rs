//! Like and read-counter repository.

use crate::error::MetadataResult;
use crate::models::StoryStatsRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    /// Recomputed like count after the toggle.
    pub likes: i64,
    /// New like state (logical negation of the pre-toggle state).
    pub is_liked: bool,
}

/// Repository for likes and per-story counters.
#[async_trait]
pub trait EngagementRepo: Send + Sync {
    /// Count likes for a story from the authoritative join table.
    async fn count_likes(&self, story_slug: &str) -> MetadataResult<i64>;

    /// Whether the user currently likes the story.
    async fn is_liked(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<bool>;

    /// Toggle the user's like and recompute the denormalized counter.
    ///
    /// The existence check, the insert/delete, the recount and the counter
    /// write all happen inside one transaction, so `story_stats.likes`
    /// always equals the join-table count when the call returns.
    async fn toggle_like(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<LikeToggle>;

    /// Fetch the denormalized counters for a story, if any exist yet.
    async fn get_story_stats(&self, story_slug: &str) -> MetadataResult<Option<StoryStatsRow>>;

    /// Atomically increment the read counter, inserting a zero-state row if
    /// needed, and return the server-confirmed new value.
    async fn increment_reads(&self, story_slug: &str) -> MetadataResult<i64>;
}
