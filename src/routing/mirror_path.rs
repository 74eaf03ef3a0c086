//! Parsing of `/<service>/<host>/<owner>/<name>[/<rest>]` paths.

use thiserror::Error;

use crate::service::repo::RepoSpec;

/// The service a mirrored wildcard prefix serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirroredService {
    Issues,
    Changes,
}

impl MirroredService {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "issues" => Some(Self::Issues),
            "changes" => Some(Self::Changes),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Changes => "changes",
        }
    }

    /// Listing page of this service on the remote web UI.
    fn remote_list(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Changes => "pulls",
        }
    }

    /// Item page of this service on the remote web UI.
    fn remote_item(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Changes => "pull",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorPathError {
    #[error("mirrored path needs an owner and a name")]
    MissingOwnerOrName,
}

/// A request path under a mirrored wildcard prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorPath<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    /// Item identifier: first segment after the name, if any.
    pub item: Option<&'a str>,
}

impl<'a> MirrorPath<'a> {
    /// Parse the part of the path after `/<service>/<host>`.
    ///
    /// `rest` is either empty or starts with `/`.
    pub fn parse(rest: &'a str) -> Result<Self, MirrorPathError> {
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let mut elems = rest.splitn(3, '/');
        let owner = elems.next().unwrap_or_default();
        let name = elems.next().unwrap_or_default();
        if owner.is_empty() || name.is_empty() {
            return Err(MirrorPathError::MissingOwnerOrName);
        }
        let item = elems
            .next()
            .and_then(|rest| rest.split('/').next())
            .filter(|item| !item.is_empty());
        Ok(Self { owner, name, item })
    }

    pub fn repo(&self, host: &str) -> RepoSpec {
        RepoSpec::new(format!("{}/{}/{}", host, self.owner, self.name))
    }

    /// The equivalent page on the remote service's web UI.
    pub fn remote_url(&self, web_url: &str, service: MirroredService) -> String {
        let web_url = web_url.trim_end_matches('/');
        match self.item {
            None => format!("{}/{}/{}/{}", web_url, self.owner, self.name, service.remote_list()),
            Some(item) => format!(
                "{}/{}/{}/{}/{}",
                web_url,
                self.owner,
                self.name,
                service.remote_item(),
                item
            ),
        }
    }
}
