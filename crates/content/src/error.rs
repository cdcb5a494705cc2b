//! Content client error types.

use thiserror::Error;

/// Errors from the CMS client.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CMS returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode CMS response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid CMS URL: {0}")]
    Url(String),
}

/// Result type for content operations.
pub type ContentResult<T> = std::result::Result<T, ContentError>;
