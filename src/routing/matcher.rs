//! Path prefix matching.
//!
//! # Design Decisions
//! - Matching is a plain, case-sensitive byte prefix test
//! - No regex to guarantee O(n) matching
//! - Specificity is the prefix length, so longer prefixes win

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns true if `path` starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// How specific the matcher is; used to rank overlapping matches.
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
