//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate mount prefixes and detect duplicate prefixes
//! - Validate value ranges (timeouts > 0, principal set)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// Sub-applications a mount may name.
pub const KNOWN_APPS: &[&str] = &["issues", "changes", "blog"];

/// Services that can be exposed under the mirrored wildcard prefix.
pub const MIRRORED_SERVICES: &[&str] = &["issues", "changes"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("mount prefix {0:?} must start with '/'")]
    PrefixNotAbsolute(String),

    #[error("mount prefix {0:?} must not end with '/'")]
    PrefixTrailingSlash(String),

    #[error("mount prefix {0:?} is registered more than once")]
    DuplicatePrefix(String),

    #[error("mount {0:?} has an empty repo")]
    EmptyRepo(String),

    #[error("mount {prefix:?} names unknown app {app:?}")]
    UnknownApp { prefix: String, app: String },

    #[error("mirror service {0:?} is not supported")]
    UnknownService(String),

    #[error("mirror host must not be empty")]
    EmptyMirrorHost,

    #[error("mirror principal id must be non-zero")]
    MissingPrincipal,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.mirror.host.is_empty() {
        errors.push(ValidationError::EmptyMirrorHost);
    }
    if config.mirror.principal.id == 0 {
        errors.push(ValidationError::MissingPrincipal);
    }

    for service in &config.mirror.services {
        if !MIRRORED_SERVICES.contains(&service.as_str()) {
            errors.push(ValidationError::UnknownService(service.clone()));
            continue;
        }
        // The wildcard prefix shares the namespace with static mounts.
        seen.insert(format!("/{}/{}", service, config.mirror.host));
    }

    for mount in &config.mounts {
        check_prefix(&mount.prefix, &mut errors);
        if !seen.insert(mount.prefix.clone()) {
            errors.push(ValidationError::DuplicatePrefix(mount.prefix.clone()));
        }
        if mount.repo.is_empty() {
            errors.push(ValidationError::EmptyRepo(mount.prefix.clone()));
        }
        if !KNOWN_APPS.contains(&mount.app.as_str()) {
            errors.push(ValidationError::UnknownApp {
                prefix: mount.prefix.clone(),
                app: mount.app.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_prefix(prefix: &str, errors: &mut Vec<ValidationError>) {
    if !prefix.starts_with('/') {
        errors.push(ValidationError::PrefixNotAbsolute(prefix.to_string()));
    }
    // Also rejects "/" itself: the root cannot be a mount.
    if prefix.ends_with('/') {
        errors.push(ValidationError::PrefixTrailingSlash(prefix.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::MountConfig;

    fn mount(prefix: &str, app: &str) -> MountConfig {
        MountConfig {
            prefix: prefix.to_string(),
            repo: "example.com/repo".to_string(),
            app: app.to_string(),
            base_uri: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.timeouts.request_secs = 0;
        config.mounts.push(mount("blog/", "blog"));
        config.mounts.push(mount("/wiki", "wiki"));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::PrefixNotAbsolute("blog/".into())));
        assert!(errors.contains(&ValidationError::PrefixTrailingSlash("blog/".into())));
        assert!(errors.contains(&ValidationError::UnknownApp {
            prefix: "/wiki".into(),
            app: "wiki".into(),
        }));
    }

    #[test]
    fn test_rejects_root_and_duplicates() {
        let mut config = AppConfig::default();
        config.mounts.push(mount("/", "blog"));
        config.mounts.push(mount("/blog", "blog"));
        config.mounts.push(mount("/blog", "issues"));
        config.mounts.push(mount("/issues/github.com", "issues"));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::PrefixTrailingSlash("/".into())));
        assert!(errors.contains(&ValidationError::DuplicatePrefix("/blog".into())));
        assert!(errors.contains(&ValidationError::DuplicatePrefix("/issues/github.com".into())));
    }

    #[test]
    fn test_rejects_unknown_mirror_service() {
        let mut config = AppConfig::default();
        config.mirror.services.push("wiki".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::UnknownService("wiki".into())]);
    }
}
