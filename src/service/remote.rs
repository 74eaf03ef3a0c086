//! Placeholder remote mirror backend.

use async_trait::async_trait;

use crate::service::changes::{
    Change, ChangeListOptions, ChangeService, Commit, DiffOptions, TimelineItem,
};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::identity::Identity;
use crate::service::issues::{
    Comment, CommentRequest, Event, Issue, IssueListOptions, IssueRequest, IssuesService,
    ListOptions, NewIssue,
};
use crate::service::repo::RepoSpec;

/// Remote mirror used when no client for the third-party service is wired in.
/// Every call fails with `ServiceError::Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

fn offline<T>() -> ServiceResult<T> {
    Err(ServiceError::Unavailable("remote mirror is not configured".to_string()))
}

#[async_trait]
impl IssuesService for OfflineRemote {
    async fn list(&self, _: &Identity, _: &RepoSpec, _: IssueListOptions) -> ServiceResult<Vec<Issue>> {
        offline()
    }

    async fn count(&self, _: &Identity, _: &RepoSpec, _: IssueListOptions) -> ServiceResult<u64> {
        offline()
    }

    async fn get(&self, _: &Identity, _: &RepoSpec, _: u64) -> ServiceResult<Issue> {
        offline()
    }

    async fn list_comments(&self, _: &Identity, _: &RepoSpec, _: u64, _: Option<ListOptions>) -> ServiceResult<Vec<Comment>> {
        offline()
    }

    async fn list_events(&self, _: &Identity, _: &RepoSpec, _: u64, _: Option<ListOptions>) -> ServiceResult<Vec<Event>> {
        offline()
    }

    async fn create(&self, _: &Identity, _: &RepoSpec, _: NewIssue) -> ServiceResult<Issue> {
        offline()
    }

    async fn create_comment(&self, _: &Identity, _: &RepoSpec, _: u64, _: String) -> ServiceResult<Comment> {
        offline()
    }

    async fn edit(&self, _: &Identity, _: &RepoSpec, _: u64, _: IssueRequest) -> ServiceResult<(Issue, Vec<Event>)> {
        offline()
    }

    async fn edit_comment(&self, _: &Identity, _: &RepoSpec, _: u64, _: CommentRequest) -> ServiceResult<Comment> {
        offline()
    }
}

#[async_trait]
impl ChangeService for OfflineRemote {
    async fn list(&self, _: &Identity, _: &RepoSpec, _: ChangeListOptions) -> ServiceResult<Vec<Change>> {
        offline()
    }

    async fn count(&self, _: &Identity, _: &RepoSpec, _: ChangeListOptions) -> ServiceResult<u64> {
        offline()
    }

    async fn get(&self, _: &Identity, _: &RepoSpec, _: u64) -> ServiceResult<Change> {
        offline()
    }

    async fn list_timeline(&self, _: &Identity, _: &RepoSpec, _: u64, _: Option<ListOptions>) -> ServiceResult<Vec<TimelineItem>> {
        offline()
    }

    async fn list_commits(&self, _: &Identity, _: &RepoSpec, _: u64) -> ServiceResult<Vec<Commit>> {
        offline()
    }

    async fn get_diff(&self, _: &Identity, _: &RepoSpec, _: u64, _: DiffOptions) -> ServiceResult<Vec<u8>> {
        offline()
    }
}
