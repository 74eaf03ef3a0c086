//! Request identification and rewriting.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Derive the sub-application request for a resolved mount
//! - Carry the mount's repository and base URI to the sub-application
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Original request consumed; the sub-application sees a rewritten copy
//!   with the same method, headers, body and extensions
//! - Mount context travels as a typed request extension, not a header

use axum::{
    body::Body,
    http::{uri::PathAndQuery, HeaderMap, HeaderValue, Request, Uri},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::Resolved;
use crate::service::repo::RepoSpec;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 request ID for requests that lack one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request ID layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// What a mounted sub-application is told about where it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountContext {
    pub repo: RepoSpec,
    /// URI prefix under which the sub-application's pages are reachable.
    pub base_uri: String,
}

/// A sub-application request plus what post-processing needs to remember.
#[derive(Debug)]
pub struct Rewritten {
    pub request: Request<Body>,
    /// Original request URI (path and query), for the login round trip.
    pub return_url: String,
}

/// Strip the mount prefix from `req` and attach the mount context.
pub fn rewrite(req: Request<Body>, resolved: &Resolved<'_>) -> Result<Rewritten, axum::http::Error> {
    let (mut parts, body) = req.into_parts();
    let return_url = parts
        .uri
        .path_and_query()
        .map(PathAndQuery::as_str)
        .unwrap_or("/")
        .to_string();

    let path = if resolved.suffix.is_empty() {
        "/"
    } else {
        resolved.suffix
    };
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };
    parts.uri = Uri::builder().path_and_query(path_and_query).build()?;

    parts.extensions.insert(MountContext {
        repo: resolved.repo.clone(),
        base_uri: resolved.base_uri.clone(),
    });

    Ok(Rewritten {
        request: Request::from_parts(parts, body),
        return_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Mount, MountTable};
    use axum::http::{header, Method};
    use axum::Router;

    fn table() -> MountTable {
        MountTable::from_mounts(vec![Mount::fixed(
            "/kebabcase/issues",
            RepoSpec::new("dmitri.shuralyov.com/kebabcase"),
            "/kebabcase/issues",
            Router::new(),
        )])
    }

    #[test]
    fn test_rewrite_strips_prefix_and_keeps_query() {
        let table = table();
        let req = Request::builder()
            .method(Method::POST)
            .uri("http://example.com/kebabcase/issues/3/comments?page=2")
            .header(header::COOKIE, "accessToken=abc")
            .body(Body::empty())
            .unwrap();
        let path = req.uri().path().to_string();
        let resolved = table.resolve(&path).unwrap();

        let rewritten = rewrite(req, &resolved).unwrap();
        assert_eq!(rewritten.return_url, "/kebabcase/issues/3/comments?page=2");

        let req = rewritten.request;
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri(), "/3/comments?page=2");
        assert_eq!(req.headers()[header::COOKIE], "accessToken=abc");
        assert_eq!(
            req.extensions().get::<MountContext>(),
            Some(&MountContext {
                repo: RepoSpec::new("dmitri.shuralyov.com/kebabcase"),
                base_uri: "/kebabcase/issues".into(),
            })
        );
    }

    #[test]
    fn test_rewrite_root() {
        let table = table();
        let req = Request::builder()
            .uri("/kebabcase/issues/")
            .body(Body::empty())
            .unwrap();
        let resolved = table.resolve("/kebabcase/issues/").unwrap();
        let rewritten = rewrite(req, &resolved).unwrap();
        assert_eq!(rewritten.request.uri(), "/");
    }

    #[test]
    fn test_make_request_id() {
        let req = Request::builder().body(()).unwrap();
        let id = MakeRequestUuidV4.make_request_id(&req).unwrap();
        let id = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }
}
