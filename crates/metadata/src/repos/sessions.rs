//! Session repository.

use crate::error::MetadataResult;
use crate::models::SessionRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for browser sessions.
#[async_trait]
pub trait SessionRepo: Send + Sync {
    /// Create a session.
    async fn create_session(&self, session: &SessionRow) -> MetadataResult<()>;

    /// Look up a session by the hash of its cookie secret.
    async fn get_session_by_hash(&self, token_hash: &str) -> MetadataResult<Option<SessionRow>>;

    /// Slide the session forward: update `refreshed_at` and `expires_at`.
    async fn refresh_session(
        &self,
        session_id: Uuid,
        refreshed_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> MetadataResult<()>;

    /// Delete a session (sign-out). Deleting an absent session is not an
    /// error.
    async fn delete_session(&self, session_id: Uuid) -> MetadataResult<()>;

    /// Delete all sessions that expired before `now`. Returns how many rows
    /// were removed.
    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> MetadataResult<u64>;
}
