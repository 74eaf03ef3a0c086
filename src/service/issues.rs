//! Issues service: types and the operation set shared by every backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::service::error::ServiceResult;
use crate::service::identity::{Identity, UserSpec};
use crate::service::repo::RepoSpec;

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// State filter used by list and count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn accepts(self, state: IssueState) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Open => state == IssueState::Open,
            StateFilter::Closed => state == IssueState::Closed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueListOptions {
    #[serde(default)]
    pub state: StateFilter,
}

/// Pagination for comment and event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub start: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub state: IssueState,
    pub title: String,
    pub user: Option<UserSpec>,
    pub body: String,
    pub replies: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub user: Option<UserSpec>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    Reopened,
    Closed,
    Renamed { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub actor: Option<UserSpec>,
    pub kind: EventKind,
}

/// New issue as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Partial update of an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub state: Option<IssueState>,
    pub title: Option<String>,
}

/// Partial update of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRequest {
    pub id: u64,
    pub body: Option<String>,
}

/// Issue tracking operations, keyed by repository.
///
/// Implemented by the local store, the remote mirror, and the facades that
/// choose between them.
#[async_trait]
pub trait IssuesService: Send + Sync {
    async fn list(&self, caller: &Identity, repo: &RepoSpec, opt: IssueListOptions) -> ServiceResult<Vec<Issue>>;

    async fn count(&self, caller: &Identity, repo: &RepoSpec, opt: IssueListOptions) -> ServiceResult<u64>;

    async fn get(&self, caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Issue>;

    async fn list_comments(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<Comment>>;

    async fn list_events(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<Event>>;

    async fn create(&self, caller: &Identity, repo: &RepoSpec, issue: NewIssue) -> ServiceResult<Issue>;

    async fn create_comment(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        body: String,
    ) -> ServiceResult<Comment>;

    async fn edit(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        req: IssueRequest,
    ) -> ServiceResult<(Issue, Vec<Event>)>;

    async fn edit_comment(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        req: CommentRequest,
    ) -> ServiceResult<Comment>;
}

/// Apply pagination to an already ordered listing.
pub fn paginate<T>(items: Vec<T>, opt: Option<ListOptions>) -> Vec<T> {
    match opt {
        None => items,
        Some(opt) => items.into_iter().skip(opt.start).take(opt.length).collect(),
    }
}
