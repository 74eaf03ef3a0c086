//! Blog sub-application: posts are issue threads; only the principal posts.

use axum::Router;
use std::sync::Arc;

use crate::apps::issues;
use crate::service::blog::PrincipalPosts;
use crate::service::identity::UserSpec;
use crate::service::issues::IssuesService;

pub fn router(posts: Arc<dyn IssuesService>, principal: UserSpec) -> Router {
    issues::router(Arc::new(PrincipalPosts::new(posts, principal)))
}
