//! Mounted sub-applications.
//!
//! Each app is a plain Axum router written as if it owned the whole path
//! space. The dispatcher strips the mount prefix and hands the app a
//! `MountContext` (repository and base URI) plus the caller `Identity`.

pub mod blog;
pub mod changes;
pub mod issues;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::service::identity::Identity;
use crate::service::issues::ListOptions;

/// The caller of a sub-application request; anonymous if nobody resolved one.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<Identity>().cloned().unwrap_or_default()))
    }
}

/// `?start=&length=` pagination for comment, event and timeline listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub start: Option<usize>,
    pub length: Option<usize>,
}

impl PageQuery {
    pub fn options(self) -> Option<ListOptions> {
        match (self.start, self.length) {
            (None, None) => None,
            (start, length) => Some(ListOptions {
                start: start.unwrap_or(0),
                length: length.unwrap_or(usize::MAX),
            }),
        }
    }
}

/// A listing together with the URI its items live under.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub base_uri: String,
    pub items: Vec<T>,
}
