//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the home server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Sub-application dispatch settings.
    pub dispatch: DispatchConfig,

    /// Session and login redirect settings.
    pub auth: AuthConfig,

    /// Remote mirror (GitHub) settings.
    pub mirror: MirrorConfig,

    /// Statically mounted sub-applications.
    pub mounts: Vec<MountConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Sub-application dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Largest response body a sub-application may produce into the recorder.
    pub max_captured_bytes: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_captured_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Session resolution and login redirect configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path of the login endpoint anonymous callers are sent to.
    pub login_path: String,

    /// Query parameter carrying the original request URI.
    pub return_query: String,

    /// Cookie holding the session token.
    pub session_cookie: String,

    /// Static session table used by the bundled identity resolver.
    pub sessions: Vec<SessionConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            return_query: "return".to_string(),
            session_cookie: "accessToken".to_string(),
            sessions: Vec::new(),
        }
    }
}

/// A session token and the user it belongs to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub token: String,
    pub user: UserConfig,
}

/// A user identity as written in config files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserConfig {
    pub id: u64,
    pub domain: String,
}

/// Remote mirror configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Host that marks a repository as mirrored (e.g., "github.com").
    pub host: String,

    /// Web UI of the remote service, target of the remote redirect.
    pub web_url: String,

    /// The only identity allowed to reach the remote mirror.
    pub principal: UserConfig,

    /// Mirrored-looking repositories that are still served locally.
    pub local_exemptions: Vec<String>,

    /// Services exposed under `/<service>/<host>/<owner>/<name>`.
    pub services: Vec<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
            web_url: "https://github.com".to_string(),
            principal: UserConfig {
                id: 1924134,
                domain: "github.com".to_string(),
            },
            local_exemptions: Vec::new(),
            services: vec!["issues".to_string(), "changes".to_string()],
        }
    }
}

/// A statically mounted sub-application.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MountConfig {
    /// Path prefix, without trailing slash (e.g., "/blog").
    pub prefix: String,

    /// Repository the sub-application believes it is serving.
    pub repo: String,

    /// Sub-application name: "issues", "changes" or "blog".
    pub app: String,

    /// Base URI handed to the sub-application (defaults to `prefix`).
    #[serde(default)]
    pub base_uri: Option<String>,
}

impl MountConfig {
    pub fn base_uri(&self) -> &str {
        self.base_uri.as_deref().unwrap_or(&self.prefix)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.auth.login_path, "/login");
        assert_eq!(config.mirror.host, "github.com");
        assert!(config.mounts.is_empty());
    }

    #[test]
    fn test_mounts_parse() {
        let config: AppConfig = toml::from_str(
            r#"
            [[mounts]]
            prefix = "/kebabcase/issues"
            repo = "dmitri.shuralyov.com/kebabcase"
            app = "issues"

            [[mounts]]
            prefix = "/idiomatic-go"
            repo = "dmitri.shuralyov.com/idiomatic-go"
            app = "issues"
            base_uri = "/idiomatic-go/entries"
            "#,
        )
        .unwrap();

        assert_eq!(config.mounts.len(), 2);
        assert_eq!(config.mounts[0].base_uri(), "/kebabcase/issues");
        assert_eq!(config.mounts[1].base_uri(), "/idiomatic-go/entries");
    }
}
