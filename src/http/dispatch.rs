//! Request dispatch to mounted sub-applications.
//!
//! # Responsibilities
//! - Resolve the mount for the request path
//! - Send non-principal callers of mirrored repositories to the remote web UI
//! - Canonicalize the bare mount prefix
//! - Run the sub-application into the recorder and finalize the result
//!
//! # Data Flow
//! ```text
//! Request (with Identity/Session extensions)
//!     → MountTable::resolve          (NotFound on miss)
//!     → mirrored && !principal ?     (RedirectRemote)
//!     → bare prefix ?                (RedirectRoot)
//!     → rewrite                      (strip prefix, attach MountContext)
//!     → Recorder::capture            (sub-application runs to completion)
//!     → finalize                     (Replay or RedirectLogin)
//! ```

use axum::{body::Body, http::Request, http::StatusCode};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::http::request::rewrite;
use crate::http::response::{finalize, LoginRedirect, Outcome, Recorder};
use crate::routing::MountTable;
use crate::service::identity::{Identity, Session};
use crate::service::mirror::MirrorPolicy;

/// Routes requests through the mount table.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: MountTable,
    policy: Arc<MirrorPolicy>,
    web_url: String,
    login: LoginRedirect,
    recorder: Recorder,
}

impl Dispatcher {
    pub fn new(
        table: MountTable,
        policy: Arc<MirrorPolicy>,
        web_url: impl Into<String>,
        login: LoginRedirect,
        recorder: Recorder,
    ) -> Self {
        Self {
            table,
            policy,
            web_url: web_url.into(),
            login,
            recorder,
        }
    }

    pub fn from_config(table: MountTable, policy: Arc<MirrorPolicy>, config: &AppConfig) -> Self {
        Self::new(
            table,
            policy,
            config.mirror.web_url.clone(),
            LoginRedirect::from_config(&config.auth),
            Recorder::new(config.dispatch.max_captured_bytes),
        )
    }

    pub fn table(&self) -> &MountTable {
        &self.table
    }

    /// Dispatch one request and decide what the client sees.
    pub async fn dispatch(&self, req: Request<Body>) -> Outcome {
        let path = req.uri().path().to_string();
        let resolved = match self.table.resolve(&path) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "No mount for request");
                return Outcome::NotFound;
            }
        };

        let identity = req.extensions().get::<Identity>().cloned().unwrap_or_default();
        let has_session = req.extensions().get::<Session>().is_some();

        if let Some((service, mirror_path)) = &resolved.mirror {
            if self.policy.is_mirrored(&resolved.repo) && !self.policy.is_principal(&identity) {
                return Outcome::RedirectRemote {
                    location: mirror_path.remote_url(&self.web_url, *service),
                };
            }
        }

        if resolved.is_bare_prefix() {
            let location = match req.uri().query() {
                Some(query) => format!("{}/?{}", resolved.prefix, query),
                None => format!("{}/", resolved.prefix),
            };
            return Outcome::RedirectRoot { location };
        }

        let app = resolved.mount.app();
        let rewritten = match rewrite(req, &resolved) {
            Ok(rewritten) => rewritten,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Unrepresentable rewritten request");
                return Outcome::Failed(StatusCode::BAD_REQUEST);
            }
        };

        let captured = match self.recorder.capture(app, rewritten.request).await {
            Ok(captured) => captured,
            Err(e) => {
                tracing::error!(path = %path, repo = %resolved.repo, error = %e, "Sub-application failed");
                return Outcome::Failed(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        finalize(captured, &rewritten.return_url, has_session, &self.login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::MountContext;
    use crate::routing::{Mount, MirroredService};
    use crate::service::identity::UserSpec;
    use crate::service::repo::RepoSpec;
    use axum::{routing::get, Extension, Router};

    fn principal() -> UserSpec {
        UserSpec::new(1924134, "github.com")
    }

    fn echo() -> Router {
        Router::new().fallback(|Extension(ctx): Extension<MountContext>, req: Request<Body>| async move {
            format!("{} {} {}", ctx.repo, ctx.base_uri, req.uri())
        })
    }

    fn dispatcher() -> Dispatcher {
        let guarded = Router::new().route("/new", get(|| async { (StatusCode::FORBIDDEN, "sign in") }));
        let table = MountTable::from_mounts(vec![
            Mount::fixed("/blog", RepoSpec::new("dmitri.shuralyov.com/blog"), "/blog", guarded),
            Mount::fixed(
                "/kebabcase/issues",
                RepoSpec::new("dmitri.shuralyov.com/kebabcase"),
                "/kebabcase/issues",
                echo(),
            ),
            Mount::mirrored(MirroredService::Issues, "github.com", echo()),
            Mount::mirrored(MirroredService::Changes, "github.com", echo()),
        ]);
        let policy = MirrorPolicy::new("github.com", principal())
            .with_exemptions(["github.com/shurcooL/issuesapp".to_string()]);
        Dispatcher::new(
            table,
            Arc::new(policy),
            "https://github.com",
            LoginRedirect::default(),
            Recorder::new(1024),
        )
    }

    fn request(uri: &str, caller: Option<UserSpec>) -> Request<Body> {
        let mut req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        if let Some(user) = caller {
            req.extensions_mut().insert(Identity::User(user.clone()));
            req.extensions_mut().insert(Session { user });
        }
        req
    }

    fn body_of(outcome: Outcome) -> String {
        match outcome {
            Outcome::Replay(captured) => String::from_utf8(captured.body.to_vec()).unwrap(),
            other => panic!("expected replay, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_path_not_found() {
        let d = dispatcher();
        assert_eq!(d.dispatch(request("/nope", None)).await, Outcome::NotFound);
        assert_eq!(d.dispatch(request("/issues/github.com/foo", None)).await, Outcome::NotFound);
    }

    #[tokio::test]
    async fn test_bare_prefix_redirects_with_query() {
        let d = dispatcher();
        assert_eq!(
            d.dispatch(request("/kebabcase/issues", None)).await,
            Outcome::RedirectRoot {
                location: "/kebabcase/issues/".into()
            }
        );
        assert_eq!(
            d.dispatch(request("/kebabcase/issues?state=closed", None)).await,
            Outcome::RedirectRoot {
                location: "/kebabcase/issues/?state=closed".into()
            }
        );
    }

    #[tokio::test]
    async fn test_fixed_mount_replays_sub_application() {
        let d = dispatcher();
        let body = body_of(d.dispatch(request("/kebabcase/issues/3?x=1", None)).await);
        assert_eq!(body, "dmitri.shuralyov.com/kebabcase /kebabcase/issues /3?x=1");
    }

    #[tokio::test]
    async fn test_mirrored_path_redirects_non_principal() {
        let d = dispatcher();
        let stranger = UserSpec::new(1, "github.com");
        assert_eq!(
            d.dispatch(request("/issues/github.com/foo/bar/42", Some(stranger))).await,
            Outcome::RedirectRemote {
                location: "https://github.com/foo/bar/issues/42".into()
            }
        );
        assert_eq!(
            d.dispatch(request("/changes/github.com/foo/bar", None)).await,
            Outcome::RedirectRemote {
                location: "https://github.com/foo/bar/pulls".into()
            }
        );
    }

    #[tokio::test]
    async fn test_mirrored_path_serves_principal() {
        let d = dispatcher();
        assert_eq!(
            d.dispatch(request("/issues/github.com/foo/bar", Some(principal()))).await,
            Outcome::RedirectRoot {
                location: "/issues/github.com/foo/bar/".into()
            }
        );
        let body = body_of(d.dispatch(request("/issues/github.com/foo/bar/42", Some(principal()))).await);
        assert_eq!(body, "github.com/foo/bar /issues/github.com/foo/bar /42");
    }

    #[tokio::test]
    async fn test_exempt_repository_served_to_everyone() {
        let d = dispatcher();
        let body = body_of(d.dispatch(request("/issues/github.com/shurcooL/issuesapp/", None)).await);
        assert_eq!(
            body,
            "github.com/shurcooL/issuesapp /issues/github.com/shurcooL/issuesapp /"
        );
    }

    #[tokio::test]
    async fn test_forbidden_becomes_login_redirect_only_without_session() {
        let d = dispatcher();
        assert_eq!(
            d.dispatch(request("/blog/new", None)).await,
            Outcome::RedirectLogin {
                location: "/login?return=%2Fblog%2Fnew".into()
            }
        );

        match d.dispatch(request("/blog/new", Some(principal()))).await {
            Outcome::Replay(captured) => {
                assert_eq!(captured.status, StatusCode::FORBIDDEN);
                assert_eq!(captured.body, "sign in");
            }
            other => panic!("expected replay, got {:?}", other),
        }
    }
}
