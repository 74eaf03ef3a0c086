//! Mount table lookup.
//!
//! # Responsibilities
//! - Store mounts (prefix, binding, sub-application)
//! - Resolve the longest registered prefix for a request path
//! - Derive the effective prefix, repo and base URI of mirrored paths
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Sorted by prefix length once, so the first match is the longest
//! - O(n) path prefix scan (acceptable for typical mount counts)
//! - Explicit errors rather than a silent default mount

use axum::Router;
use thiserror::Error;

use crate::routing::matcher::PrefixMatcher;
use crate::routing::mirror_path::{MirrorPath, MirrorPathError, MirroredService};
use crate::service::repo::RepoSpec;

/// What a mount tells its sub-application about the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A single repository served at a fixed prefix.
    Fixed { repo: RepoSpec, base_uri: String },
    /// Any `<owner>/<name>` repository on `host`, taken from the path.
    Mirrored { service: MirroredService, host: String },
}

/// A sub-application bound to a path prefix.
#[derive(Debug, Clone)]
pub struct Mount {
    matcher: PrefixMatcher,
    binding: Binding,
    app: Router,
}

impl Mount {
    pub fn fixed(
        prefix: impl Into<String>,
        repo: RepoSpec,
        base_uri: impl Into<String>,
        app: Router,
    ) -> Self {
        Self {
            matcher: PrefixMatcher::new(prefix),
            binding: Binding::Fixed {
                repo,
                base_uri: base_uri.into(),
            },
            app,
        }
    }

    /// Mount `app` at `/<service>/<host>`.
    pub fn mirrored(service: MirroredService, host: impl Into<String>, app: Router) -> Self {
        let host = host.into();
        Self {
            matcher: PrefixMatcher::new(format!("/{}/{}", service.name(), host)),
            binding: Binding::Mirrored { service, host },
            app,
        }
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn app(&self) -> &Router {
        &self.app
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no mount for path")]
    NoMount,

    #[error(transparent)]
    MalformedMirrorPath(#[from] MirrorPathError),
}

/// A request path resolved against the mount table.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub mount: &'a Mount,
    /// Effective prefix; for mirrored mounts it includes `/<owner>/<name>`.
    pub prefix: String,
    /// Path after `prefix`: empty for the bare prefix, otherwise starts with `/`.
    pub suffix: &'a str,
    pub repo: RepoSpec,
    pub base_uri: String,
    /// Set for mirrored mounts.
    pub mirror: Option<(MirroredService, MirrorPath<'a>)>,
}

impl Resolved<'_> {
    /// True when the request named the prefix without a trailing slash.
    pub fn is_bare_prefix(&self) -> bool {
        self.suffix.is_empty()
    }
}

/// Immutable set of mounts.
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    mounts: Vec<Mount>,
}

impl MountTable {
    pub fn from_mounts(mut mounts: Vec<Mount>) -> Self {
        // Longest prefix first so the first match wins.
        mounts.sort_by(|a, b| b.prefix().len().cmp(&a.prefix().len()));
        Self { mounts }
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Find the mount serving `path`.
    pub fn resolve<'a>(&'a self, path: &'a str) -> Result<Resolved<'a>, RouteError> {
        let (mount, rest) = self
            .mounts
            .iter()
            .find_map(|m| m.matcher.suffix(path).map(|rest| (m, rest)))
            .ok_or(RouteError::NoMount)?;

        match &mount.binding {
            Binding::Fixed { repo, base_uri } => Ok(Resolved {
                mount,
                prefix: mount.prefix().to_string(),
                suffix: rest,
                repo: repo.clone(),
                base_uri: base_uri.clone(),
                mirror: None,
            }),
            Binding::Mirrored { service, host } => {
                let parsed = MirrorPath::parse(rest)?;
                let prefix = format!("{}/{}/{}", mount.prefix(), parsed.owner, parsed.name);
                let suffix = &path[prefix.len()..];
                Ok(Resolved {
                    mount,
                    base_uri: prefix.clone(),
                    prefix,
                    suffix,
                    repo: parsed.repo(host),
                    mirror: Some((*service, parsed)),
                })
            }
        }
    }
}
