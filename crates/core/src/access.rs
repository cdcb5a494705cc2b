//! Shareable access codes.
//!
//! A code is the secret half of a public access token: anyone holding it can
//! open the matching path without an account. Generated codes are 16 random
//! bytes rendered as 32 lowercase hex characters.

use crate::error::{Error, Result};
use crate::ACCESS_CODE_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated access code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCode(String);

impl AccessCode {
    /// Generate a fresh random code using a cryptographically secure RNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; ACCESS_CODE_LEN / 2];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex_encode(&bytes))
    }

    /// Accept a caller-supplied code.
    ///
    /// Custom codes are allowed (the admin UI lets operators pick memorable
    /// ones) but must be non-empty, reasonably short, and free of characters
    /// that would break a URL query parameter.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidAccessCode("code must not be empty".into()));
        }
        if trimmed.len() > 128 {
            return Err(Error::InvalidAccessCode("code too long".into()));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidAccessCode(format!(
                "code contains invalid characters: {trimmed}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The code as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_32_hex_chars() {
        let code = AccessCode::generate();
        assert_eq!(code.as_str().len(), 32);
        assert!(code.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_codes_are_unique() {
        assert_ne!(AccessCode::generate(), AccessCode::generate());
    }

    #[test]
    fn parse_accepts_custom_codes() {
        assert!(AccessCode::parse("my-custom_code42").is_ok());
        assert_eq!(AccessCode::parse("  abc  ").unwrap().as_str(), "abc");
    }

    #[test]
    fn parse_rejects_empty_and_unsafe() {
        assert!(AccessCode::parse("").is_err());
        assert!(AccessCode::parse("   ").is_err());
        assert!(AccessCode::parse("has space").is_err());
        assert!(AccessCode::parse("a/b").is_err());
    }
}
