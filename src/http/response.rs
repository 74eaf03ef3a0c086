//! Response recording and finalization.
//!
//! # Responsibilities
//! - Run a sub-application into an in-memory recorder
//! - Decide how a recorded response reaches the client
//! - Write exactly one response per request
//!
//! # Data Flow
//! ```text
//! Recorder::capture(app, request)     (produce into buffer)
//!     → CapturedResponse { status, headers, body }
//!     → finalize(captured, return_url, has_session)
//!     → Outcome::{Replay | RedirectLogin}
//!     → Outcome::into_response        (single write)
//! ```
//!
//! # Design Decisions
//! - The recorder is fully populated before finalize runs, so a response
//!   is never demoted to a login redirect halfway through
//! - Finalize is a pure function of its inputs and needs no network I/O

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tower::ServiceExt;
use url::form_urlencoded;

use crate::config::AuthConfig;

/// A sub-application response held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read sub-application body: {0}")]
    Body(#[from] axum::Error),
}

/// Invokes sub-applications with a buffering response writer.
#[derive(Debug, Clone, Copy)]
pub struct Recorder {
    max_body_bytes: usize,
}

impl Recorder {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    /// Run `app` on `request` and buffer everything it writes.
    pub async fn capture(&self, app: &Router, request: Request<Body>) -> Result<CapturedResponse, CaptureError> {
        let response = app
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});
        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(body, self.max_body_bytes).await?;
        Ok(CapturedResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

/// Where anonymous callers are sent to sign in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    path: String,
    return_query: String,
}

impl LoginRedirect {
    pub fn new(path: impl Into<String>, return_query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            return_query: return_query.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.login_path.clone(), config.return_query.clone())
    }

    /// Login URL that returns to `return_url` afterwards.
    pub fn location(&self, return_url: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.return_query, return_url)
            .finish();
        format!("{}?{}", self.path, query)
    }
}

impl Default for LoginRedirect {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// Final result of dispatching one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No mount, or a malformed mirrored path.
    NotFound,
    /// Bare mount prefix; 301 to the prefix with a trailing slash.
    RedirectRoot { location: String },
    /// Non-principal navigating into a mirrored repository.
    RedirectRemote { location: String },
    /// Sub-application refused an anonymous caller.
    RedirectLogin { location: String },
    /// Send the recorded response as is.
    Replay(CapturedResponse),
    /// The dispatch itself failed.
    Failed(StatusCode),
}

impl Outcome {
    /// Short name for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::NotFound => "not_found",
            Outcome::RedirectRoot { .. } => "redirect_root",
            Outcome::RedirectRemote { .. } => "redirect_remote",
            Outcome::RedirectLogin { .. } => "redirect_login",
            Outcome::Replay(_) => "replay",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// Decide what the client sees for a recorded response.
pub fn finalize(
    captured: CapturedResponse,
    return_url: &str,
    has_session: bool,
    login: &LoginRedirect,
) -> Outcome {
    if captured.status == StatusCode::FORBIDDEN && !has_session {
        return Outcome::RedirectLogin {
            location: login.location(return_url),
        };
    }
    Outcome::Replay(captured)
}

fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::try_from(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location = %location, "Unrepresentable redirect location");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::NotFound => (StatusCode::NOT_FOUND, "404 page not found").into_response(),
            Outcome::RedirectRoot { location } => redirect(StatusCode::MOVED_PERMANENTLY, &location),
            Outcome::RedirectRemote { location } | Outcome::RedirectLogin { location } => {
                redirect(StatusCode::FOUND, &location)
            }
            Outcome::Replay(captured) => {
                let mut response = Response::new(Body::from(captured.body));
                *response.status_mut() = captured.status;
                let headers = response.headers_mut();
                for (name, value) in captured.headers.iter() {
                    headers.append(name, value.clone());
                }
                response
            }
            Outcome::Failed(status) => status.into_response(),
        }
    }
}
