//! Issue tracker sub-application.
//!
//! # Routes (relative to the mount)
//! - `GET /` list (`?state=open|closed|all`), `POST /` create
//! - `GET /count`
//! - `GET /{id}`, `PATCH /{id}` edit
//! - `GET /{id}/comments`, `POST /{id}/comments`, `PATCH /{id}/comments`
//! - `GET /{id}/events`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::apps::{Caller, Listing, PageQuery};
use crate::http::request::MountContext;
use crate::service::error::ServiceResult;
use crate::service::issues::{
    Comment, CommentRequest, Event, Issue, IssueListOptions, IssueRequest, IssuesService, NewIssue,
};

type Service = Arc<dyn IssuesService>;

#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct Edited {
    pub issue: Issue,
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Count {
    pub count: u64,
}

pub fn router(service: Service) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/count", get(count))
        .route("/{id}", get(show).patch(edit))
        .route(
            "/{id}/comments",
            get(list_comments).post(create_comment).patch(edit_comment),
        )
        .route("/{id}/events", get(list_events))
        .with_state(service)
}

async fn list(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Query(opt): Query<IssueListOptions>,
) -> ServiceResult<Json<Listing<Issue>>> {
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
    Query(opt): Query<IssueListOptions>,
) -> ServiceResult<Json<Count>> {
    let count = service.count(&caller, &ctx.repo, opt).await?;
    Ok(Json(Count { count }))
}

async fn show(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Issue>> {
    Ok(Json(service.get(&caller, &ctx.repo, id).await?))
}

async fn create(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Json(issue): Json<NewIssue>,
) -> ServiceResult<(StatusCode, Json<Issue>)> {
    let issue = service.create(&caller, &ctx.repo, issue).await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

async fn edit(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<IssueRequest>,
) -> ServiceResult<Json<Edited>> {
    let (issue, events) = service.edit(&caller, &ctx.repo, id, req).await?;
    Ok(Json(Edited { issue, events }))
}

async fn list_comments(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Query(page): Query<PageQuery>,
) -> ServiceResult<Json<Vec<Comment>>> {
    Ok(Json(service.list_comments(&caller, &ctx.repo, id, page.options()).await?))
}

async fn create_comment(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(comment): Json<NewComment>,
) -> ServiceResult<(StatusCode, Json<Comment>)> {
    let comment = service.create_comment(&caller, &ctx.repo, id, comment.body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn edit_comment(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<CommentRequest>,
) -> ServiceResult<Json<Comment>> {
    Ok(Json(service.edit_comment(&caller, &ctx.repo, id, req).await?))
}

async fn list_events(
    State(service): State<Service>,
    Extension(ctx): Extension<MountContext>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Query(page): Query<PageQuery>,
) -> ServiceResult<Json<Vec<Event>>> {
    Ok(Json(service.list_events(&caller, &ctx.repo, id, page.options()).await?))
}
