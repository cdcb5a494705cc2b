//! Session secrets.
//!
//! The browser cookie carries an opaque random secret; the store keeps only
//! its SHA-256 hash, so a leaked database snapshot does not yield usable
//! sessions.

use crate::error::{Error, Result};
use crate::SESSION_SECRET_LEN;
use sha2::{Digest, Sha256};
use std::fmt;

/// An opaque session secret as carried by the cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Generate a fresh random secret (32 random bytes, hex-encoded).
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; SESSION_SECRET_LEN / 2];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Parse a secret from a cookie value.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != SESSION_SECRET_LEN || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidSessionSecret(
                "secret must be 64 hex characters".into(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// The raw secret for the Set-Cookie header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// SHA-256 hash of the secret, hex-encoded, for storage lookup.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

// Never print the secret itself.
impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionSecret(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_round_trips_through_parse() {
        let secret = SessionSecret::generate();
        assert_eq!(secret.expose().len(), 64);
        let parsed = SessionSecret::parse(secret.expose()).unwrap();
        assert_eq!(parsed.hash(), secret.hash());
    }

    #[test]
    fn hash_is_stable_and_distinct_from_secret() {
        let secret = SessionSecret::generate();
        assert_eq!(secret.hash(), secret.hash());
        assert_ne!(secret.hash(), secret.expose());
        assert_eq!(secret.hash().len(), 64);
    }

    #[test]
    fn parse_rejects_malformed_values() {
        assert!(SessionSecret::parse("short").is_err());
        assert!(SessionSecret::parse(&"g".repeat(64)).is_err());
    }

    #[test]
    fn debug_does_not_leak_the_secret() {
        let secret = SessionSecret::generate();
        let debug = format!("{secret:?}");
        assert!(!debug.contains(secret.expose()));
    }
}
