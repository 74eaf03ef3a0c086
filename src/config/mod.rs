//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → lifecycle::startup builds the mount table and services from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the mount table never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::AuthConfig;
pub use schema::MirrorConfig;
pub use schema::MountConfig;
pub use schema::ObservabilityConfig;
