//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router around the dispatcher
//! - Wire up middleware (tracing, timeout, request ID, session)
//! - Bind server to listener
//! - Observability (metrics, correlation IDs)
//!
//! # Design Decisions
//! - A single fallback handler: the mount table, not Axum, owns routing
//! - Session resolution runs inside the request ID and trace layers so
//!   its log lines carry the request's span

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::dispatch::Dispatcher;
use crate::http::middleware::{session_middleware, SessionState};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP front end of the mount table.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, sessions: SessionState, config: &AppConfig) -> Self {
        let state = AppState { dispatcher };
        let router = Self::build_router(config, state, sessions);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, sessions: SessionState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(sessions, session_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The fully layered router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let outcome = state.dispatcher.dispatch(request).await;

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        outcome = outcome.label(),
        "Dispatched request"
    );
    metrics::record_dispatch(outcome.label(), start_time);

    outcome.into_response()
}
