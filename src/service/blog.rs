//! Blog posting policy.

use async_trait::async_trait;
use std::sync::Arc;

use crate::service::error::{ServiceError, ServiceResult};
use crate::service::identity::{Identity, UserSpec};
use crate::service::issues::{
    Comment, CommentRequest, Event, Issue, IssueListOptions, IssueRequest, IssuesService,
    ListOptions, NewIssue,
};
use crate::service::repo::RepoSpec;

/// Issues service where only the principal may open new threads (posts).
/// Everyone else can still read and comment.
pub struct PrincipalPosts {
    inner: Arc<dyn IssuesService>,
    principal: UserSpec,
}

impl PrincipalPosts {
    pub fn new(inner: Arc<dyn IssuesService>, principal: UserSpec) -> Self {
        Self { inner, principal }
    }
}

#[async_trait]
impl IssuesService for PrincipalPosts {
    async fn list(&self, caller: &Identity, repo: &RepoSpec, opt: IssueListOptions) -> ServiceResult<Vec<Issue>> {
        self.inner.list(caller, repo, opt).await
    }

    async fn count(&self, caller: &Identity, repo: &RepoSpec, opt: IssueListOptions) -> ServiceResult<u64> {
        self.inner.count(caller, repo, opt).await
    }

    async fn get(&self, caller: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Issue> {
        self.inner.get(caller, repo, id).await
    }

    async fn list_comments(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<Comment>> {
        self.inner.list_comments(caller, repo, id, opt).await
    }

    async fn list_events(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        opt: Option<ListOptions>,
    ) -> ServiceResult<Vec<Event>> {
        self.inner.list_events(caller, repo, id, opt).await
    }

    async fn create(&self, caller: &Identity, repo: &RepoSpec, issue: NewIssue) -> ServiceResult<Issue> {
        if !caller.is(&self.principal) {
            return Err(ServiceError::PermissionDenied);
        }
        self.inner.create(caller, repo, issue).await
    }

    async fn create_comment(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        body: String,
    ) -> ServiceResult<Comment> {
        self.inner.create_comment(caller, repo, id, body).await
    }

    async fn edit(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        req: IssueRequest,
    ) -> ServiceResult<(Issue, Vec<Event>)> {
        self.inner.edit(caller, repo, id, req).await
    }

    async fn edit_comment(
        &self,
        caller: &Identity,
        repo: &RepoSpec,
        id: u64,
        req: CommentRequest,
    ) -> ServiceResult<Comment> {
        self.inner.edit_comment(caller, repo, id, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::memory::MemoryIssues;

    fn post() -> NewIssue {
        NewIssue {
            title: "Hello".into(),
            body: "First post.".into(),
        }
    }

    #[tokio::test]
    async fn test_only_principal_creates_posts() {
        let principal = UserSpec::new(1924134, "github.com");
        let blog = PrincipalPosts::new(Arc::new(MemoryIssues::new()), principal.clone());
        let repo = RepoSpec::new("dmitri.shuralyov.com/blog");

        let visitor = Identity::User(UserSpec::new(5, "github.com"));
        assert_eq!(
            blog.create(&visitor, &repo, post()).await.unwrap_err(),
            ServiceError::PermissionDenied
        );

        let owner = Identity::User(principal);
        let created = blog.create(&owner, &repo, post()).await.unwrap();

        // Visitors may still comment on an existing post.
        blog.create_comment(&visitor, &repo, created.id, "Nice".into())
            .await
            .unwrap();
        assert_eq!(blog.get(&Identity::Anonymous, &repo, created.id).await.unwrap().replies, 1);
    }
}
