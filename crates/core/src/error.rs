//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),

    #[error("invalid access code: {0}")]
    InvalidAccessCode(String),

    #[error("invalid session secret: {0}")]
    InvalidSessionSecret(String),

    #[error("invalid slug: {0}")]
    InvalidSlug(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
