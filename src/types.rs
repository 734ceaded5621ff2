//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of job names and lookup keys
//! (both are strings on the wire) and make call sites self-documenting.

use std::fmt;

/// The name of a downstream build job, as it appears in the third field
/// of the mapping source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobName(pub String);

impl JobName {
    pub fn new(s: impl Into<String>) -> Self {
        JobName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobName {
    fn from(s: String) -> Self {
        JobName(s)
    }
}

impl From<&str> for JobName {
    fn from(s: &str) -> Self {
        JobName(s.to_string())
    }
}

/// A canonical mapping lookup key derived from a (repository, branch[, file])
/// tuple. Always produced by [`crate::key::build_key`], never constructed
/// from raw user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Crate-internal: only the key builder assembles keys.
    pub(crate) fn new(s: impl Into<String>) -> Self {
        LookupKey(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
