//! Core domain types and shared logic for the Lantern reading site.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Route constants for the protected application area
//! - Access-token path patterns and shareable bypass codes
//! - Session secrets and their at-rest hashing
//! - Configuration types

pub mod access;
pub mod config;
pub mod error;
pub mod pattern;
pub mod routes;
pub mod session;

pub use access::AccessCode;
pub use error::{Error, Result};
pub use pattern::PathPattern;
pub use session::SessionSecret;

/// Length of a generated access code in hex characters.
pub const ACCESS_CODE_LEN: usize = 32;

/// Length of a session secret in hex characters.
pub const SESSION_SECRET_LEN: usize = 64;
