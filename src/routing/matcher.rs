//! Mount prefix matching.
//!
//! # Responsibilities
//! - Match a request path against a mount prefix
//! - Split a matched path into prefix and sub-application path
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix matches only whole segments: `/blog` matches `/blog` and
//!   `/blog/x`, never `/blogroll`
//! - No regex to guarantee O(n) matching

/// Matches the request path against a mount prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// Create a new prefix matcher. The prefix has no trailing slash.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True if `path` is the prefix itself or lies below it.
    pub fn matches(&self, path: &str) -> bool {
        self.suffix(path).is_some()
    }

    /// The part of `path` after the prefix: `""` for the bare prefix,
    /// otherwise a string starting with `/`.
    pub fn suffix<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}
