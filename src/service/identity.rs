//! Caller identity as consumed by the services.
//!
//! Authentication happens elsewhere; this layer only receives an already
//! resolved identity and compares it against the mirror principal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::schema::UserConfig;

/// Stable comparison key for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserSpec {
    pub id: u64,
    pub domain: String,
}

impl UserSpec {
    pub fn new(id: u64, domain: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
        }
    }
}

impl fmt::Display for UserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.domain)
    }
}

impl From<&UserConfig> for UserSpec {
    fn from(user: &UserConfig) -> Self {
        Self::new(user.id, user.domain.clone())
    }
}

/// The resolved caller of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    User(UserSpec),
}

impl Identity {
    pub fn user(&self) -> Option<&UserSpec> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }

    pub fn is(&self, user: &UserSpec) -> bool {
        self.user() == Some(user)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous => f.write_str("anonymous"),
            Identity::User(user) => write!(f, "{}", user),
        }
    }
}

/// An authenticated session attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: UserSpec,
}
