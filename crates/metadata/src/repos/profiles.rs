//! Profile repository.

use crate::error::MetadataResult;
use crate::models::ProfileRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for user profiles.
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    /// Create a profile. Fails with `AlreadyExists` on a duplicate email.
    async fn create_profile(&self, profile: &ProfileRow) -> MetadataResult<()>;

    /// Look up a profile by user id.
    async fn get_profile(&self, user_id: Uuid) -> MetadataResult<Option<ProfileRow>>;

    /// Look up a profile by email.
    async fn get_profile_by_email(&self, email: &str) -> MetadataResult<Option<ProfileRow>>;

    /// Insert the profile if no row exists for its user id yet. Used by
    /// startup bootstrap to provision the master account idempotently.
    async fn ensure_profile(&self, profile: &ProfileRow) -> MetadataResult<()>;
}
