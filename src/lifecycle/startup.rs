//! Startup orchestration.
//!
//! # Responsibilities
//! - Wire local and remote backends into the mirror facades
//! - Build every configured mount and the mirrored wildcard mounts
//! - Assemble the dispatcher, session resolver and HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Backends are injected, so tests can swap in their own remote mirror
//! - The mount table is frozen before the server accepts traffic

use std::sync::Arc;
use thiserror::Error;

use crate::apps;
use crate::config::{AppConfig, ConfigError};
use crate::http::middleware::{SessionState, StaticSessions};
use crate::http::{Dispatcher, HttpServer};
use crate::routing::{Mount, MirroredService, MountTable};
use crate::service::changes::ChangeService;
use crate::service::identity::UserSpec;
use crate::service::issues::IssuesService;
use crate::service::memory::{MemoryChanges, MemoryIssues};
use crate::service::mirror::{MirrorPolicy, Mirrored};
use crate::service::remote::OfflineRemote;
use crate::service::repo::RepoSpec;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown sub-application {app:?} mounted at {prefix}")]
    UnknownApp { prefix: String, app: String },

    #[error("unknown mirrored service {0:?}")]
    UnknownService(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Data stores behind the sub-applications.
#[derive(Clone)]
pub struct Backends {
    pub local_issues: Arc<dyn IssuesService>,
    pub local_changes: Arc<dyn ChangeService>,
    pub remote_issues: Arc<dyn IssuesService>,
    pub remote_changes: Arc<dyn ChangeService>,
    /// Raw post store wrapped by the blog policy.
    pub posts: Arc<dyn IssuesService>,
}

impl Backends {
    /// In-memory local stores and an offline remote mirror.
    pub fn in_memory() -> Self {
        Self {
            local_issues: Arc::new(MemoryIssues::new()),
            local_changes: Arc::new(MemoryChanges::new()),
            remote_issues: Arc::new(OfflineRemote),
            remote_changes: Arc::new(OfflineRemote),
            posts: Arc::new(MemoryIssues::new()),
        }
    }
}

/// The services the sub-applications talk to.
struct Services {
    issues: Arc<dyn IssuesService>,
    changes: Arc<dyn ChangeService>,
    posts: Arc<dyn IssuesService>,
    principal: UserSpec,
}

impl Services {
    fn new(backends: Backends, policy: &Arc<MirrorPolicy>) -> Self {
        Self {
            issues: Arc::new(Mirrored::new(
                backends.local_issues,
                backends.remote_issues,
                policy.clone(),
            )),
            changes: Arc::new(Mirrored::new(
                backends.local_changes,
                backends.remote_changes,
                policy.clone(),
            )),
            posts: backends.posts,
            principal: policy.principal().clone(),
        }
    }

    fn app(&self, name: &str) -> Option<axum::Router> {
        match name {
            "issues" => Some(apps::issues::router(self.issues.clone())),
            "changes" => Some(apps::changes::router(self.changes.clone())),
            "blog" => Some(apps::blog::router(self.posts.clone(), self.principal.clone())),
            _ => None,
        }
    }
}

/// Build the mount table for `config`.
pub fn build_mounts(config: &AppConfig, backends: Backends, policy: &Arc<MirrorPolicy>) -> Result<MountTable, StartupError> {
    let services = Services::new(backends, policy);
    let mut mounts = Vec::with_capacity(config.mounts.len() + config.mirror.services.len());

    for mount in &config.mounts {
        let app = services.app(&mount.app).ok_or_else(|| StartupError::UnknownApp {
            prefix: mount.prefix.clone(),
            app: mount.app.clone(),
        })?;
        mounts.push(Mount::fixed(
            mount.prefix.clone(),
            RepoSpec::new(mount.repo.clone()),
            mount.base_uri(),
            app,
        ));
    }

    for name in &config.mirror.services {
        let service = MirroredService::from_name(name)
            .ok_or_else(|| StartupError::UnknownService(name.clone()))?;
        let app = services
            .app(service.name())
            .ok_or_else(|| StartupError::UnknownService(name.clone()))?;
        mounts.push(Mount::mirrored(service, config.mirror.host.clone(), app));
    }

    let table = MountTable::from_mounts(mounts);
    tracing::info!(
        mounts = table.len(),
        mirror_host = %config.mirror.host,
        "Mount table built"
    );
    Ok(table)
}

/// Assemble the HTTP server for `config` on top of `backends`.
pub fn build_server(config: &AppConfig, backends: Backends) -> Result<HttpServer, StartupError> {
    let policy = Arc::new(MirrorPolicy::from_config(&config.mirror));
    let table = build_mounts(config, backends, &policy)?;
    let dispatcher = Dispatcher::from_config(table, policy, config);
    let sessions = SessionState {
        resolver: Arc::new(StaticSessions::from_config(&config.auth)),
        cookie: config.auth.session_cookie.clone(),
    };
    Ok(HttpServer::new(Arc::new(dispatcher), sessions, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::routing::Binding;

    const CONFIG: &str = r#"
        [[mounts]]
        prefix = "/blog"
        repo = "dmitri.shuralyov.com/blog"
        app = "blog"

        [[mounts]]
        prefix = "/idiomatic-go"
        repo = "dmitri.shuralyov.com/idiomatic-go"
        app = "issues"
        base_uri = "/idiomatic-go/entries"
    "#;

    fn policy(config: &AppConfig) -> Arc<MirrorPolicy> {
        Arc::new(MirrorPolicy::from_config(&config.mirror))
    }

    #[test]
    fn test_build_mounts() {
        let config = parse_config(CONFIG).unwrap();
        let table = build_mounts(&config, Backends::in_memory(), &policy(&config)).unwrap();
        assert_eq!(table.len(), 4);

        let resolved = table.resolve("/idiomatic-go/3").unwrap();
        assert_eq!(resolved.base_uri, "/idiomatic-go/entries");

        let resolved = table.resolve("/changes/github.com/foo/bar/1").unwrap();
        assert!(matches!(
            resolved.mount.binding(),
            Binding::Mirrored {
                service: MirroredService::Changes,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_app_is_fatal() {
        let mut config = AppConfig::default();
        config.mounts.push(crate::config::MountConfig {
            prefix: "/wiki".into(),
            repo: "dmitri.shuralyov.com/wiki".into(),
            app: "wiki".into(),
            base_uri: None,
        });
        let err = build_mounts(&config, Backends::in_memory(), &policy(&config)).unwrap_err();
        assert!(matches!(err, StartupError::UnknownApp { .. }));
    }
}
