//! Dual-backend delegation.
//!
//! # Responsibilities
//! - Classify a repository as local or remote-mirrored
//! - Allow only the principal through to the remote mirror
//! - Forward every operation verbatim to the chosen backend
//!
//! # Design Decisions
//! - One adapter (`Mirrored`) and one decision point (`Mirrored::backend`)
//!   for every operation of every service
//! - Backend results and errors are returned untouched; only
//!   `ServiceError::PermissionDenied` is synthesized here

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::schema::MirrorConfig;
use crate::observability::metrics;
use crate::service::changes::{
    Change, ChangeListOptions, ChangeService, Commit, DiffOptions, TimelineItem,
};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::identity::{Identity, UserSpec};
use crate::service::issues::{
    Comment, CommentRequest, Event, Issue, IssueListOptions, IssueRequest, IssuesService,
    ListOptions, NewIssue,
};
use crate::service::repo::RepoSpec;

/// Where a call for a given repository and caller goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegation {
    Local,
    RemoteMirror,
    Forbidden,
}

impl Delegation {
    pub fn as_str(self) -> &'static str {
        match self {
            Delegation::Local => "local",
            Delegation::RemoteMirror => "remote_mirror",
            Delegation::Forbidden => "forbidden",
        }
    }
}

/// Classification rules for mirrored repositories.
#[derive(Debug, Clone)]
pub struct MirrorPolicy {
    host: String,
    exemptions: HashSet<String>,
    principal: UserSpec,
}

impl MirrorPolicy {
    pub fn new(host: impl Into<String>, principal: UserSpec) -> Self {
        Self {
            host: host.into(),
            exemptions: HashSet::new(),
            principal,
        }
    }

    pub fn from_config(config: &MirrorConfig) -> Self {
        Self::new(config.host.clone(), UserSpec::from(&config.principal))
            .with_exemptions(config.local_exemptions.iter().cloned())
    }

    /// Keep these repositories local even though they live under the mirror host.
    pub fn with_exemptions(mut self, repos: impl IntoIterator<Item = String>) -> Self {
        self.exemptions.extend(repos);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn principal(&self) -> &UserSpec {
        &self.principal
    }

    /// True if calls for `repo` belong to the remote mirror.
    pub fn is_mirrored(&self, repo: &RepoSpec) -> bool {
        repo.is_under(&self.host) && !self.exemptions.contains(repo.uri())
    }

    pub fn is_principal(&self, caller: &Identity) -> bool {
        caller.is(&self.principal)
    }

    pub fn decide(&self, repo: &RepoSpec, caller: &Identity) -> Delegation {
        if !self.is_mirrored(repo) {
            Delegation::Local
        } else if self.is_principal(caller) {
            Delegation::RemoteMirror
        } else {
            Delegation::Forbidden
        }
    }
}

/// A service that sends each call to a local or a remote backend.
pub struct Mirrored<S: ?Sized> {
    local: Arc<S>,
    remote: Arc<S>,
    policy: Arc<MirrorPolicy>,
}

impl<S: ?Sized> Mirrored<S> {
    pub fn new(local: Arc<S>, remote: Arc<S>, policy: Arc<MirrorPolicy>) -> Self {
        Self {
            local,
            remote,
            policy,
        }
    }

    /// The backend that serves `repo` for `caller`.
    fn backend(&self, caller: &Identity, repo: &RepoSpec) -> ServiceResult<&S> {
        let decision = self.policy.decide(repo, caller);
        metrics::record_delegation(decision.as_str());
        match decision {
            Delegation::Local => Ok(&*self.local),
            Delegation::RemoteMirror => Ok(&*self.remote),
            Delegation::Forbidden => {
                tracing::debug!(repo = %repo, caller = %caller, "Denied mirrored repository");
                Err(ServiceError::PermissionDenied)
            }
        }
    }
}

#[async_trait]
impl IssuesService for Mirrored<dyn IssuesService> {
    async fn list(&self, caller: &Identity, repo: &RepoSpec, opt: IssueListOptions) -> ServiceResult<Vec<Issue>> {
        self.backend(caller, repo)?.list(caller, repo, opt).await
    }

    async fn count(&self, caller: &Identity, repo: &RepoSpec, opt: IssueListOptions) -> ServiceResult<u64> {
        self.backend(caller, repo)?.count(caller, repo, opt).await
    }

    async fn get(&self, caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Issue> {
        self.backend(caller, repo)?.get(caller, repo, id).await
    }

    async fn list_comments(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<Comment>> {
        self.backend(caller, repo)?.list_comments(caller, repo, id, opt).await
    }

    async fn list_events(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<Event>> {
        self.backend(caller, repo)?.list_events(caller, repo, id, opt).await
    }

    async fn create(&self, caller: &Identity, repo: &RepoSpec, issue: NewIssue) -> ServiceResult<Issue> {
        self.backend(caller, repo)?.create(caller, repo, issue).await
    }

    async fn create_comment(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        body: String,
    ) -> ServiceResult<Comment> {
        self.backend(caller, repo)?.create_comment(caller, repo, id, body).await
    }

    async fn edit(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        req: IssueRequest,
    ) -> ServiceResult<(Issue, Vec<Event>)> {
        self.backend(caller, repo)?.edit(caller, repo, id, req).await
    }

    async fn edit_comment(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        req: CommentRequest,
    ) -> ServiceResult<Comment> {
        self.backend(caller, repo)?.edit_comment(caller, repo, id, req).await
    }
}

#[async_trait]
impl ChangeService for Mirrored<dyn ChangeService> {
    async fn list(&self, caller: &Identity, repo: &RepoSpec, opt: ChangeListOptions) -> ServiceResult<Vec<Change>> {
        self.backend(caller, repo)?.list(caller, repo, opt).await
    }

    async fn count(&self, caller: &Identity, repo: &RepoSpec, opt: ChangeListOptions) -> ServiceResult<u64> {
        self.backend(caller, repo)?.count(caller, repo, opt).await
    }

    async fn get(&self, caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Change> {
        self.backend(caller, repo)?.get(caller, repo, id).await
    }

    async fn list_timeline(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<TimelineItem>> {
        self.backend(caller, repo)?.list_timeline(caller, repo, id, opt).await
    }

    async fn list_commits(&self, caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Vec<Commit>> {
        self.backend(caller, repo)?.list_commits(caller, repo, id).await
    }

    async fn get_diff(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: DiffOptions,
    ) -> ServiceResult<Vec<u8>> {
        self.backend(caller, repo)?.get_diff(caller, repo, id, opt).await
    }
}
