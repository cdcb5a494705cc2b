//! Bookmark repository.
//!
//! Bookmarks are a join table keyed on (user_id, story_slug), mirroring the
//! like relationship, so a toggle is an atomic insert or delete rather than
//! a read-modify-write of a whole array.

use crate::error::MetadataResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for per-user bookmarks.
#[async_trait]
pub trait BookmarkRepo: Send + Sync {
    /// Whether the user has bookmarked the story.
    async fn is_bookmarked(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<bool>;

    /// Toggle the bookmark and return the new state.
    async fn toggle_bookmark(&self, story_slug: &str, user_id: Uuid) -> MetadataResult<bool>;

    /// List the user's bookmarked slugs, newest first.
    async fn list_bookmarks(&self, user_id: Uuid) -> MetadataResult<Vec<String>>;
}
