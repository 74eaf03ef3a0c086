//! Multi-tenant home server: mounts independent sub-applications under path
//! prefixes and mirrors third-party repositories for a single principal.

pub mod apps;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod service;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
