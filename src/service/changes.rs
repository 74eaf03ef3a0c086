//! Change (code review) service: types and operation set.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::service::error::ServiceResult;
use crate::service::identity::{Identity, UserSpec};
use crate::service::issues::ListOptions;
use crate::service::repo::RepoSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    Open,
    Closed,
    Merged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl ChangeFilter {
    pub fn accepts(self, state: ChangeState) -> bool {
        match self {
            ChangeFilter::All => true,
            ChangeFilter::Open => state == ChangeState::Open,
            ChangeFilter::Closed => state != ChangeState::Open,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeListOptions {
    #[serde(default)]
    pub filter: ChangeFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub id: u64,
    pub state: ChangeState,
    pub title: String,
    pub author: Option<UserSpec>,
    pub replies: u32,
    pub commits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: Option<UserSpec>,
}

/// An entry in a change's discussion timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimelineItem {
    Comment {
        id: u64,
        user: Option<UserSpec>,
        body: String,
    },
    Review {
        id: u64,
        user: Option<UserSpec>,
        approved: bool,
    },
    Event {
        id: u64,
        actor: Option<UserSpec>,
        description: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Restrict the diff to a single commit.
    pub commit: Option<String>,
}

/// Change review operations, keyed by repository.
#[async_trait]
pub trait ChangeService: Send + Sync {
    async fn list(&self, caller: &Identity, repo: &RepoSpec, opt: ChangeListOptions) -> ServiceResult<Vec<Change>>;

    async fn count(&self, caller: &Identity, repo: &RepoSpec, opt: ChangeListOptions) -> ServiceResult<u64>;

    async fn get(&self, caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Change>;

    async fn list_timeline(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<TimelineItem>>;

    async fn list_commits(&self, caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Vec<Commit>>;

    async fn get_diff(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: DiffOptions,
    ) -> ServiceResult<Vec<u8>>;
}
