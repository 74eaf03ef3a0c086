//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, tracing)
//!     → middleware/session.rs (resolve the caller)
//!     → dispatch.rs (mount lookup, remote and root redirects)
//!     → request.rs (rewrite for the sub-application)
//!     → response.rs (record, finalize, single write)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::Dispatcher;
pub use request::{MountContext, X_REQUEST_ID};
pub use response::{LoginRedirect, Outcome, Recorder};
pub use server::HttpServer;
