//! Service error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors returned by issues and changes services.
///
/// `PermissionDenied` is only ever produced by the mirror facade and the blog
/// policy; everything else comes from a backend and is passed through as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("permission denied")]
    PermissionDenied,

    /// A refusal decided by a backend itself, e.g. an anonymous write.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ServiceError::PermissionDenied)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::PermissionDenied | ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Backend(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Service call failed");
        }
        (status, self.to_string()).into_response()
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
