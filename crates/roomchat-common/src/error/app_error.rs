//! Application error types
//!
//! Infrastructure and auth failures in one type, plus the mapping from
//! backend error codes to text a person can act on.

use roomchat_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Generic text for failures that have no better description
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Not signed in")]
    NotAuthenticated,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Database errors, keyed by SQLSTATE (or platform) code
    #[error("Backend error {code}: {message}")]
    Backend { code: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    // Redis errors
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Stable error code
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Backend { .. } => "BACKEND_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Caused by what the user asked for rather than by infrastructure
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidCredentials
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::NotAuthenticated
            | Self::Validation(_)
            | Self::NotFound(_)
            | Self::Conflict(_) => true,
            Self::Domain(e) => !e.is_infrastructure(),
            _ => false,
        }
    }

    /// Text suitable for an alert
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Incorrect email or password.".to_string(),
            Self::InvalidToken | Self::TokenExpired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::NotAuthenticated => "Please sign in to continue.".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} could not be found."),
            Self::Conflict(msg) => msg.clone(),
            Self::Backend { code, .. } => describe_backend_code(code).to_string(),
            Self::Domain(DomainError::Backend { code, .. }) => describe_backend_code(code).to_string(),
            Self::Domain(e) if !e.is_infrastructure() => e.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Create a not found error for a resource type
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Human-readable text for the backend error codes the client knows
///
/// Unknown codes get the generic message.
#[must_use]
pub fn describe_backend_code(code: &str) -> &'static str {
    match code {
        "23505" => "This item already exists.",
        "23503" => "A related item no longer exists.",
        "23502" => "A required field is missing.",
        "23514" => "The value is not allowed.",
        "42501" => "You do not have permission to do that.",
        "40001" => "The request conflicted with another change. Please try again.",
        "57014" => "The request took too long and was cancelled.",
        "PGRST116" => "Nothing was found.",
        _ => GENERIC_ERROR_MESSAGE,
    }
}

/// Serializable error summary for UI layers
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.user_message(),
            details: None,
        }
    }
}

impl From<AppError> for ErrorReport {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_backend_codes() {
        assert_eq!(describe_backend_code("23505"), "This item already exists.");
        assert_eq!(describe_backend_code("42501"), "You do not have permission to do that.");
        assert_eq!(describe_backend_code("PGRST116"), "Nothing was found.");
        for code in ["23503", "23502", "23514", "40001", "57014"] {
            assert_ne!(describe_backend_code(code), GENERIC_ERROR_MESSAGE, "{code}");
        }
    }

    #[test]
    fn test_unknown_backend_code_is_generic() {
        assert_eq!(describe_backend_code("XX000"), GENERIC_ERROR_MESSAGE);
        assert_eq!(describe_backend_code(""), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_user_message_for_wrapped_backend_error() {
        let err = AppError::from(DomainError::backend("23503", "fk violation"));
        assert_eq!(err.user_message(), "A related item no longer exists.");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_user_message_for_domain_rule() {
        let err = AppError::from(DomainError::ContentTooLong { max: 2000 });
        assert_eq!(err.user_message(), "Content too long: max 2000 characters");
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "CONTENT_TOO_LONG");
    }

    #[test]
    fn test_internal_errors_stay_generic() {
        let err = AppError::internal(anyhow::anyhow!("pool exhausted"));
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_error_report() {
        let err = AppError::not_found("Chatroom");
        let report = ErrorReport::from(&err);

        assert_eq!(report.code, "NOT_FOUND");
        assert_eq!(report.message, "Chatroom could not be found.");
        assert!(report.details.is_none());
    }
}
