//! Change review sub-application.
//!
//! # Routes (relative to the mount)
//! - `GET /` list (`?filter=open|closed|all`), `GET /count`
//! - `GET /{id}`
//! - `GET /{id}/timeline`, `GET /{id}/commits`
//! - `GET /{id}/diff` (`?commit=<sha>`), served as text/plain

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::apps::issues::Count;
use crate::apps::{Caller, Listing, PageQuery};
use crate::http::request::MountContext;
use crate::service::changes::{Change, ChangeListOptions, ChangeService, Commit, DiffOptions, TimelineItem};
use crate::service::error::ServiceResult;

type Service = Arc<dyn ChangeService>;

pub fn router(service: Service) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/count", get(count))
        .route("/{id}", get(show))
        .route("/{id}/timeline", get(timeline))
        .route("/{id}/commits", get(commits))
        .route("/{id}/diff", get(diff))
        .with_state(service)
}

async fn list(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Query(opt): Query<ChangeListOptions>,
) -> ServiceResult<Json<Listing<Change>>> {
    let items = service.list(&caller, &ctx.repo, opt).await?;
    Ok(Json(Listing {
        base_uri: ctx.base_uri,
        items,
    }))
}

async fn count(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Query(opt): Query<ChangeListOptions>,
) -> ServiceResult<Json<Count>> {
    let count = service.count(&caller, &ctx.repo, opt).await?;
    Ok(Json(Count { count }))
}

async fn show(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Change>> {
    Ok(Json(service.get(&caller, &ctx.repo, id).await?))
}

async fn timeline(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Query(page): Query<PageQuery>,
) -> ServiceResult<Json<Vec<TimelineItem>>> {
    Ok(Json(service.list_timeline(&caller, &ctx.repo, id, page.options()).await?))
}

async fn commits(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Vec<Commit>>> {
    Ok(Json(service.list_commits(&caller, &ctx.repo, id).await?))
}

async fn diff(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Query(opt): Query<DiffOptions>,
) -> ServiceResult<impl IntoResponse> {
    let diff = service.get_diff(&caller, &ctx.repo, id, opt).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], diff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::changes::ChangeState;
    use crate::service::identity::UserSpec;
    use crate::service::memory::{ChangeRecord, MemoryChanges};
    use crate::service::repo::RepoSpec;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn repo() -> RepoSpec {
        RepoSpec::new("dmitri.shuralyov.com/kebabcase")
    }

    fn store() -> MemoryChanges {
        let store = MemoryChanges::new();
        let author = Some(UserSpec::new(7, "example.com"));
        store.insert(
            repo(),
            ChangeRecord {
                change: Change {
                    id: 1,
                    state: ChangeState::Merged,
                    title: "Add kebab-case helper".into(),
                    author: author.clone(),
                    replies: 0,
                    commits: 1,
                },
                commits: vec![Commit {
                    sha: "abc123".into(),
                    message: "Add helper".into(),
                    author: author.clone(),
                }],
                timeline: Vec::new(),
                diff: b"diff --git a/kebab.go b/kebab.go\n".to_vec(),
                commit_diffs: HashMap::from([("abc123".to_string(), b"commit diff\n".to_vec())]),
            },
        );
        store.insert(
            repo(),
            ChangeRecord {
                change: Change {
                    id: 2,
                    state: ChangeState::Open,
                    title: "Handle acronyms".into(),
                    author,
                    replies: 0,
                    commits: 0,
                },
                commits: Vec::new(),
                timeline: Vec::new(),
                diff: Vec::new(),
                commit_diffs: HashMap::new(),
            },
        );
        store
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let mut req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        req.extensions_mut().insert(MountContext {
            repo: repo(),
            base_uri: "/kebabcase/changes".into(),
        });
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_list_filters() {
        let app = router(Arc::new(store()));

        let (status, _, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        let listing: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(listing["base_uri"], "/kebabcase/changes");
        assert_eq!(listing["items"].as_array().map(Vec::len), Some(1));
        assert_eq!(listing["items"][0]["id"], 2);

        let (_, _, body) = get(&app, "/count?filter=closed").await;
        assert_eq!(body, r#"{"count":1}"#);
        let (_, _, body) = get(&app, "/count?filter=all").await;
        assert_eq!(body, r#"{"count":2}"#);
    }

    #[tokio::test]
    async fn test_diff_is_plain_text() {
        let app = router(Arc::new(store()));

        let (status, content_type, body) = get(&app, "/1/diff").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
        assert_eq!(body, "diff --git a/kebab.go b/kebab.go\n");

        let (_, _, body) = get(&app, "/1/diff?commit=abc123").await;
        assert_eq!(body, "commit diff\n");
    }

    #[tokio::test]
    async fn test_commits_and_missing_change() {
        let app = router(Arc::new(store()));

        let (_, _, body) = get(&app, "/1/commits").await;
        let commits: Vec<Commit> = serde_json::from_str(&body).unwrap();
        assert_eq!(commits[0].sha, "abc123");

        let (status, _, _) = get(&app, "/9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
