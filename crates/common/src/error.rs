//! Error types for rawmate.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// The caller's role may not perform this action.
    #[error("{0}")]
    Role(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An active join request already exists for the same group and user.
    #[error("{0}")]
    DuplicateRequest(String),

    /// A status change that is not allowed from the current status.
    #[error("{0}")]
    InvalidTransition(String),

    /// Admission would push a group past its total quantity.
    #[error("{0}")]
    CapacityExceeded(String),

    /// A vendor tried to join their own group.
    #[error("{0}")]
    SelfJoin(String),

    // === Server Errors ===
    /// External commodity-price lookup failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Persistence failure.
    #[error("Store error: {0}")]
    Database(String),

    /// Configuration failure.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::Validation(_)
            | Self::DuplicateRequest(_)
            | Self::InvalidTransition(_)
            | Self::CapacityExceeded(_)
            | Self::SelfJoin(_) => StatusCode::BAD_REQUEST,
            Self::Role(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,

            // 5xx Server Errors
            Self::Upstream(_) | Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Role(_) => "ROLE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::DuplicateRequest(_) => "DUPLICATE_REQUEST",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            Self::SelfJoin(_) => "SELF_JOIN",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Database(_) => "STORE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Human readable message for the response body.
    ///
    /// Server errors get a generic message; the raw cause goes to [`Self::detail`].
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Upstream(_) => "Failed to fetch market prices".to_string(),
            Self::Database(_) => "Store operation failed".to_string(),
            Self::Config(_) => "Server is misconfigured".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Raw error detail, only present for server errors.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Upstream(d) | Self::Database(d) | Self::Config(d) | Self::Internal(d) => {
                Some(d.as_str())
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "message": self.message(),
            "code": code,
            "error": self.detail(),
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Role("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        for err in [
            AppError::DuplicateRequest("x".into()),
            AppError::InvalidTransition("x".into()),
            AppError::CapacityExceeded("x".into()),
            AppError::SelfJoin("x".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(
            AppError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_errors_carry_plain_message() {
        let err = AppError::Role("Only vendors can join groups.".into());
        assert_eq!(err.message(), "Only vendors can join groups.");
        assert!(err.detail().is_none());
    }

    #[test]
    fn test_server_errors_expose_detail() {
        let err = AppError::Database("connection reset".into());
        assert_eq!(err.detail(), Some("connection reset"));
        assert_eq!(err.error_code(), "STORE_ERROR");
        assert!(err.is_server_error());
    }
}
