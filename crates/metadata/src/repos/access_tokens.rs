//! Public access token repository.

use crate::error::MetadataResult;
use crate::models::AccessTokenRow;
use async_trait::async_trait;

/// Repository for public access token operations.
#[async_trait]
pub trait AccessTokenRepo: Send + Sync {
    /// Create a token. Fails with `AlreadyExists` if the code is taken.
    async fn create_access_token(&self, token: &AccessTokenRow) -> MetadataResult<()>;

    /// Look up a token by its code.
    async fn get_access_token(&self, code: &str) -> MetadataResult<Option<AccessTokenRow>>;

    /// List all tokens, newest first.
    async fn list_access_tokens(&self) -> MetadataResult<Vec<AccessTokenRow>>;

    /// Update the path pattern of an existing token.
    async fn update_access_token_path(
        &self,
        code: &str,
        path: &str,
    ) -> MetadataResult<AccessTokenRow>;

    /// Replace a token's code (and path) atomically. The old row is deleted
    /// and a new one inserted inside a single transaction, preserving
    /// uniqueness of the new code.
    async fn replace_access_token(
        &self,
        code: &str,
        new_code: &str,
        path: &str,
    ) -> MetadataResult<AccessTokenRow>;

    /// Delete a token by code. Deleting an absent code is not an error.
    async fn delete_access_token(&self, code: &str) -> MetadataResult<()>;
}
