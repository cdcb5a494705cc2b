//! Access-token path patterns.
//!
//! A pattern grants public access to a slice of the protected area. Three
//! structural forms are supported, tried in order; the first that applies
//! decides the outcome:
//!
//! 1. Exact: the pattern equals the path byte-for-byte.
//! 2. Dynamic segments: `[slug]`-style placeholders each match exactly one
//!    non-empty path segment (never a `/`).
//! 3. Prefix: a trailing `*` matches any path starting with the literal
//!    prefix before it.
//!
//! Dynamic segments and a trailing wildcard never combine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated access-token path pattern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathPattern(String);

impl PathPattern {
    /// Parse and validate a pattern.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidPattern("pattern must not be empty".into()));
        }
        if !trimmed.starts_with('/') {
            return Err(Error::InvalidPattern(format!(
                "pattern must start with '/': {trimmed}"
            )));
        }
        // Unbalanced brackets would silently never match; reject them early.
        for segment in trimmed.split('/') {
            let opens = segment.matches('[').count();
            let closes = segment.matches(']').count();
            if opens != closes {
                return Err(Error::InvalidPattern(format!(
                    "unbalanced brackets in segment '{segment}'"
                )));
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The pattern as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether `path` is granted by this pattern.
    pub fn matches(&self, path: &str) -> bool {
        if path == self.0 {
            return true;
        }

        if self.0.contains('[') && self.0.contains(']') {
            return Self::match_segments(&self.0, path);
        }

        if let Some(prefix) = self.0.strip_suffix('*') {
            return path.starts_with(prefix);
        }

        false
    }

    /// Segment-wise comparison: a `[...]` pattern segment matches any single
    /// non-empty path segment; everything else must be equal.
    fn match_segments(pattern: &str, path: &str) -> bool {
        let mut pattern_segs = pattern.split('/');
        let mut path_segs = path.split('/');

        loop {
            match (pattern_segs.next(), path_segs.next()) {
                (None, None) => return true,
                (None, Some(_)) | (Some(_), None) => return false,
                (Some(p), Some(s)) => {
                    let dynamic = p.starts_with('[') && p.ends_with(']') && p.len() > 2;
                    if dynamic {
                        if s.is_empty() {
                            return false;
                        }
                    } else if p != s {
                        return false;
                    }
                }
            }
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
