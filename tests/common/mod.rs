//! Shared utilities for integration tests.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use home_router::config::schema::{SessionConfig, UserConfig};
use home_router::config::{AppConfig, MountConfig};
use home_router::lifecycle::{build_server, Backends, Shutdown};
use home_router::service::error::{ServiceError, ServiceResult};
use home_router::service::identity::Identity;
use home_router::service::issues::{
    Comment, CommentRequest, Event, Issue, IssueListOptions, IssueRequest, IssueState,
    IssuesService, ListOptions, NewIssue,
};
use home_router::service::repo::RepoSpec;

pub const PRINCIPAL_TOKEN: &str = "principal-token";
pub const VISITOR_TOKEN: &str = "visitor-token";

/// Config with a blog, a local issue tracker, one exempt repository and
/// sessions for the principal and a visitor.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.mirror.local_exemptions = vec!["github.com/shurcooL/issuesapp".into()];
    config.mounts = vec![
        MountConfig {
            prefix: "/blog".into(),
            repo: "dmitri.shuralyov.com/blog".into(),
            app: "blog".into(),
            base_uri: None,
        },
        MountConfig {
            prefix: "/kebabcase/issues".into(),
            repo: "dmitri.shuralyov.com/kebabcase".into(),
            app: "issues".into(),
            base_uri: None,
        },
    ];
    config.auth.sessions = vec![
        SessionConfig {
            token: PRINCIPAL_TOKEN.into(),
            user: UserConfig {
                id: 1924134,
                domain: "github.com".into(),
            },
        },
        SessionConfig {
            token: VISITOR_TOKEN.into(),
            user: UserConfig {
                id: 42,
                domain: "github.com".into(),
            },
        },
    ];
    config
}

/// Start the server on an ephemeral port.
pub async fn start_server(config: AppConfig, backends: Backends) -> (SocketAddr, Shutdown) {
    let server = build_server(&config, backends).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Remote mirror double: serves one issue per repository and counts calls.
#[derive(Default)]
pub struct StubRemote {
    pub calls: AtomicUsize,
}

impl StubRemote {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn mirrored_issue(repo: &RepoSpec) -> Issue {
    Issue {
        id: 1,
        state: IssueState::Open,
        title: format!("Mirrored from {}", repo),
        user: None,
        body: String::new(),
        replies: 0,
    }
}

#[async_trait]
impl IssuesService for StubRemote {
    async fn list(&self, _: &Identity, repo: &RepoSpec, _: IssueListOptions) -> ServiceResult<Vec<Issue>> {
        self.hit();
        Ok(vec![mirrored_issue(repo)])
    }

    async fn count(&self, _: &Identity, _: &RepoSpec, _: IssueListOptions) -> ServiceResult<u64> {
        self.hit();
        Ok(1)
    }

    async fn get(&self, _: &Identity, repo: &RepoSpec, id: u64) -> ServiceResult<Issue> {
        self.hit();
        match id {
            1 => Ok(mirrored_issue(repo)),
            _ => Err(ServiceError::NotFound),
        }
    }

    async fn list_comments(&self, _: &Identity, _: &RepoSpec, _: u64, _: Option<ListOptions>) -> ServiceResult<Vec<Comment>> {
        self.hit();
        Ok(Vec::new())
    }

    async fn list_events(&self, _: &Identity, _: &RepoSpec, _: u64, _: Option<ListOptions>) -> ServiceResult<Vec<Event>> {
        self.hit();
        Ok(Vec::new())
    }

    async fn create(&self, _: &Identity, _: &RepoSpec, _: NewIssue) -> ServiceResult<Issue> {
        self.hit();
        Err(ServiceError::Backend("read-only mirror".into()))
    }

    async fn create_comment(&self, _: &Identity, _: &RepoSpec, _: u64, _: String) -> ServiceResult<Comment> {
        self.hit();
        Err(ServiceError::Backend("read-only mirror".into()))
    }

    async fn edit(&self, _: &Identity, _: &RepoSpec, _: u64, _: IssueRequest) -> ServiceResult<(Issue, Vec<Event>)> {
        self.hit();
        Err(ServiceError::Backend("read-only mirror".into()))
    }

    async fn edit_comment(&self, _: &Identity, _: &RepoSpec, _: u64, _: CommentRequest) -> ServiceResult<Comment> {
        self.hit();
        Err(ServiceError::Backend("read-only mirror".into()))
    }
}

/// In-memory backends with `remote` as the issues mirror.
#[allow(dead_code)]
pub fn backends_with_remote(remote: Arc<StubRemote>) -> Backends {
    Backends {
        remote_issues: remote,
        ..Backends::in_memory()
    }
}
