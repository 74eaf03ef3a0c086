//! In-memory local backend.
//!
//! Stands in for the persistent store: keeps every repository's threads in a
//! `DashMap`, so concurrent requests only contend on the same repository.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

use crate::service::changes::{
    Change, ChangeListOptions, ChangeService, Commit, DiffOptions, TimelineItem,
};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::identity::{Identity, UserSpec};
use crate::service::issues::{
    paginate, Comment, CommentRequest, Event, EventKind, Issue, IssueListOptions, IssueRequest,
    IssueState, IssuesService, ListOptions, NewIssue,
};
use crate::service::repo::RepoSpec;

struct Thread {
    issue: Issue,
    comments: Vec<Comment>,
    events: Vec<Event>,
}

impl Thread {
    fn push_event(&mut self, actor: &UserSpec, kind: EventKind) -> Event {
        let event = Event {
            id: self.events.len() as u64 + 1,
            actor: Some(actor.clone()),
            kind,
        };
        self.events.push(event.clone());
        event
    }
}

fn signed_in(caller: &Identity) -> ServiceResult<&UserSpec> {
    caller
        .user()
        .ok_or_else(|| ServiceError::Forbidden("sign in required".to_string()))
}

/// Issues kept in process memory, ids assigned per repository from 1.
#[derive(Default)]
pub struct MemoryIssues {
    repos: DashMap<RepoSpec, Vec<Thread>>,
}

impl MemoryIssues {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_thread<T>(
        &self,
        repo: &RepoSpec,
        id: u64,
        f: impl FnOnce(&mut Thread) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let mut threads = self.repos.get_mut(repo).ok_or(ServiceError::NotFound)?;
        let index = usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .ok_or(ServiceError::NotFound)?;
        let thread = threads.value_mut().get_mut(index).ok_or(ServiceError::NotFound)?;
        f(thread)
    }

    fn matching(&self, repo: &RepoSpec, opt: IssueListOptions) -> Vec<Issue> {
        let Some(threads) = self.repos.get(repo) else {
            return Vec::new();
        };
        threads
            .iter()
            .rev()
            .filter(|t| opt.state.accepts(t.issue.state))
            .map(|t| t.issue.clone())
            .collect()
    }
}

#[async_trait]
impl IssuesService for MemoryIssues {
    async fn list(&self, _caller: &Identity, repo: &RepoSpec, opt: IssueListOptions) -> ServiceResult<Vec<Issue>> {
        Ok(self.matching(repo, opt))
    }

    async fn count(&self, _caller: &Identity, repo: &RepoSpec, opt: IssueListOptions) -> ServiceResult<u64> {
        Ok(self.matching(repo, opt).len() as u64)
    }

    async fn get(&self, _caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Issue> {
        self.with_thread(repo, id, |t| Ok(t.issue.clone()))
    }

    async fn list_comments(
        &self,
        _caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<Comment>> {
        self.with_thread(repo, id, |t| Ok(paginate(t.comments.clone(), opt)))
    }

    async fn list_events(
        &self,
        _caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<Event>> {
        self.with_thread(repo, id, |t| Ok(paginate(t.events.clone(), opt)))
    }

    async fn create(&self, caller: &Identity, repo: &RepoSpec, issue: NewIssue) -> ServiceResult<Issue> {
        let user = signed_in(caller)?;
        let title = issue.title.trim();
        if title.is_empty() {
            return Err(ServiceError::InvalidInput("title must not be empty".to_string()));
        }

        let mut threads = self.repos.entry(repo.clone()).or_default();
        let created = Issue {
            id: threads.len() as u64 + 1,
            state: IssueState::Open,
            title: title.to_string(),
            user: Some(user.clone()),
            body: issue.body,
            replies: 0,
        };
        threads.push(Thread {
            issue: created.clone(),
            comments: Vec::new(),
            events: Vec::new(),
        });
        Ok(created)
    }

    async fn create_comment(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        body: String,
    ) -> ServiceResult<Comment> {
        let user = signed_in(caller)?;
        if body.trim().is_empty() {
            return Err(ServiceError::InvalidInput("comment must not be empty".to_string()));
        }
        self.with_thread(repo, id, |t| {
            let comment = Comment {
                id: t.comments.len() as u64 + 1,
                user: Some(user.clone()),
                body,
            };
            t.comments.push(comment.clone());
            t.issue.replies += 1;
            Ok(comment)
        })
    }

    async fn edit(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        req: IssueRequest,
    ) -> ServiceResult<(Issue, Vec<Event>)> {
        let user = signed_in(caller)?;
        if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ServiceError::InvalidInput("title must not be empty".to_string()));
        }
        self.with_thread(repo, id, |t| {
            let mut events = Vec::new();
            if let Some(state) = req.state.filter(|s| *s != t.issue.state) {
                t.issue.state = state;
                let kind = match state {
                    IssueState::Open => EventKind::Reopened,
                    IssueState::Closed => EventKind::Closed,
                };
                events.push(t.push_event(user, kind));
            }
            if let Some(title) = req.title.map(|s| s.trim().to_string()) {
                if title != t.issue.title {
                    let from = std::mem::replace(&mut t.issue.title, title.clone());
                    events.push(t.push_event(user, EventKind::Renamed { from, to: title }));
                }
            }
            Ok((t.issue.clone(), events))
        })
    }

    async fn edit_comment(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        req: CommentRequest,
    ) -> ServiceResult<Comment> {
        let user = signed_in(caller)?;
        self.with_thread(repo, id, |t| {
            let comment = t
                .comments
                .iter_mut()
                .find(|c| c.id == req.id)
                .ok_or(ServiceError::NotFound)?;
            if comment.user.as_ref() != Some(user) {
                return Err(ServiceError::Forbidden("only the author can edit a comment".to_string()));
            }
            if let Some(body) = req.body {
                comment.body = body;
            }
            Ok(comment.clone())
        })
    }
}

/// Everything the local store knows about one change.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub change: Change,
    pub commits: Vec<Commit>,
    pub timeline: Vec<TimelineItem>,
    pub diff: Vec<u8>,
    /// Per-commit diffs, keyed by commit SHA.
    pub commit_diffs: HashMap<String, Vec<u8>>,
}

/// Changes kept in process memory. Changes arrive through `insert`; the
/// service surface itself is read-only.
#[derive(Default)]
pub struct MemoryChanges {
    repos: DashMap<RepoSpec, Vec<ChangeRecord>>,
}

impl MemoryChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a change.
    pub fn insert(&self, repo: RepoSpec, record: ChangeRecord) {
        let mut records = self.repos.entry(repo).or_default();
        records.retain(|r| r.change.id != record.change.id);
        records.push(record);
        records.sort_by(|a, b| b.change.id.cmp(&a.change.id));
    }

    fn with_record<T>(
        &self,
        repo: &RepoSpec,
        id: u64,
        f: impl FnOnce(&ChangeRecord) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let records = self.repos.get(repo).ok_or(ServiceError::NotFound)?;
        let record = records
            .iter()
            .find(|r| r.change.id == id)
            .ok_or(ServiceError::NotFound)?;
        f(record)
    }

    fn matching(&self, repo: &RepoSpec, opt: ChangeListOptions) -> Vec<Change> {
        let Some(records) = self.repos.get(repo) else {
            return Vec::new();
        };
        records
            .iter()
            .filter(|r| opt.filter.accepts(r.change.state))
            .map(|r| r.change.clone())
            .collect()
    }
}

#[async_trait]
impl ChangeService for MemoryChanges {
    async fn list(&self, _caller: &Identity, repo: &RepoSpec, opt: ChangeListOptions) -> ServiceResult<Vec<Change>> {
        Ok(self.matching(repo, opt))
    }

    async fn count(&self, _caller: &Identity, repo: &RepoSpec, opt: ChangeListOptions) -> ServiceResult<u64> {
        Ok(self.matching(repo, opt).len() as u64)
    }

    async fn get(&self, _caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Change> {
        self.with_record(repo, id, |r| Ok(r.change.clone()))
    }

    async fn list_timeline(
        &self,
        _caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<TimelineItem>> {
        self.with_record(repo, id, |r| Ok(paginate(r.timeline.clone(), opt)))
    }

    async fn list_commits(&self, _caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Vec<Commit>> {
        self.with_record(repo, id, |r| Ok(r.commits.clone()))
    }

    async fn get_diff(
        &self,
        _caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: DiffOptions,
    ) -> ServiceResult<Vec<u8>> {
        self.with_record(repo, id, |r| match opt.commit {
            None => Ok(r.diff.clone()),
            Some(sha) => r.commit_diffs.get(&sha).cloned().ok_or(ServiceError::NotFound),
        })
    }
}
