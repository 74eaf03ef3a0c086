//! Session Middleware.
//! Resolves the caller before dispatch.

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::config::AuthConfig;
use crate::service::identity::{Identity, Session, UserSpec};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// A session token was presented but is not (or no longer) valid.
    #[error("bad access token")]
    BadToken,

    #[error("identity lookup failed: {0}")]
    Lookup(String),
}

/// Resolves the session of an incoming request.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` means the caller is anonymous.
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, IdentityError>;
}

/// Find a cookie value in the request headers.
pub fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Session table from configuration, keyed by cookie token.
#[derive(Debug, Clone, Default)]
pub struct StaticSessions {
    cookie: String,
    tokens: HashMap<String, UserSpec>,
}

impl StaticSessions {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
            tokens: HashMap::new(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        config
            .sessions
            .iter()
            .fold(Self::new(config.session_cookie.clone()), |sessions, s| {
                sessions.with_session(s.token.clone(), UserSpec::from(&s.user))
            })
    }

    pub fn with_session(mut self, token: impl Into<String>, user: UserSpec) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticSessions {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, IdentityError> {
        let Some(token) = cookie(headers, &self.cookie) else {
            return Ok(None);
        };
        match self.tokens.get(token) {
            Some(user) => Ok(Some(Session { user: user.clone() })),
            None => Err(IdentityError::BadToken),
        }
    }
}

/// State required by the session middleware.
#[derive(Clone)]
pub struct SessionState {
    pub resolver: Arc<dyn IdentityResolver>,
    /// Cookie cleared when the resolver rejects its token.
    pub cookie: String,
}

pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let mut clear_cookie = false;

    // Resolution failures downgrade the caller to anonymous.
    let session = match state.resolver.resolve(req.headers()).await {
        Ok(session) => session,
        Err(IdentityError::BadToken) => {
            clear_cookie = true;
            None
        }
        Err(e) => {
            warn!(error = %e, "Identity resolution failed, continuing as anonymous");
            None
        }
    };

    let identity = session
        .as_ref()
        .map(|s| Identity::User(s.user.clone()))
        .unwrap_or_default();
    req.extensions_mut().insert(identity);
    if let Some(session) = session {
        req.extensions_mut().insert(session);
    }

    let mut response = next.run(req).await;
    if clear_cookie {
        let expired = format!("{}=; Path=/; Max-Age=0", state.cookie);
        if let Ok(value) = HeaderValue::from_str(&expired) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn sessions() -> StaticSessions {
        StaticSessions::new("accessToken").with_session("t0k3n", UserSpec::new(1924134, "github.com"))
    }

    fn app() -> Router {
        let state = SessionState {
            resolver: Arc::new(sessions()),
            cookie: "accessToken".into(),
        };
        Router::new()
            .route(
                "/",
                get(|req: Request<Body>| async move {
                    let identity = req.extensions().get::<Identity>().cloned().unwrap_or_default();
                    let has_session = req.extensions().get::<Session>().is_some();
                    format!("{} {}", identity, has_session)
                }),
            )
            .layer(middleware::from_fn_with_state(state, session_middleware))
    }

    async fn call(cookie: Option<&str>) -> (Response, String) {
        let mut req = Request::builder().uri("/");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let response = app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let (parts, body) = response.into_parts();
        let body = body.collect().await.unwrap().to_bytes();
        (
            Response::from_parts(parts, Body::empty()),
            String::from_utf8(body.to_vec()).unwrap(),
        )
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; accessToken=abc"));
        assert_eq!(cookie(&headers, "accessToken"), Some("abc"));
        assert_eq!(cookie(&headers, "missing"), None);
    }

    #[tokio::test]
    async fn test_valid_session() {
        let (_, body) = call(Some("accessToken=t0k3n")).await;
        assert_eq!(body, "1924134@github.com true");
    }

    #[tokio::test]
    async fn test_no_cookie_is_anonymous() {
        let (response, body) = call(None).await;
        assert_eq!(body, "anonymous false");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_bad_token_is_anonymous_and_cleared() {
        let (response, body) = call(Some("accessToken=stale")).await;
        assert_eq!(body, "anonymous false");
        assert_eq!(
            response.headers()[header::SET_COOKIE],
            "accessToken=; Path=/; Max-Age=0"
        );
    }
}
