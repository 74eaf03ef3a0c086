//! Repository identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a content namespace, e.g. `github.com/foo/bar` or
/// `dmitri.shuralyov.com/kebabcase`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoSpec(String);

impl RepoSpec {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn uri(&self) -> &str {
        &self.0
    }

    /// True if the URI lives under `host/`.
    pub fn is_under(&self, host: &str) -> bool {
        self.0
            .strip_prefix(host)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Owner and name of a `host/owner/name` URI.
    pub fn owner_and_name(&self, host: &str) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix(host)?.strip_prefix('/')?;
        let (owner, name) = rest.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoSpec {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}
