//! Field paths: dot-separated addressing of (possibly nested) record attributes
//!
//! A `FieldPath` is derived from a query parameter key by the normalizer
//! (`__` becomes `.`); it is never user-constructed beyond that substitution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Dot-separated sequence of identifiers addressing a record attribute.
///
/// Invariant: non-empty, with no empty segments (`a..b` is rejected).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Build a path from pre-split segments.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self, Error> {
        let joined = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(".");
        joined.parse()
    }

    /// The dot-joined path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.split('.').any(str::is_empty) {
            return Err(Error::Validation {
                parameter: s.to_string(),
                reason: "field path must be non-empty dot-separated identifiers".to_string(),
            });
        }
        Ok(FieldPath(s.to_string()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
