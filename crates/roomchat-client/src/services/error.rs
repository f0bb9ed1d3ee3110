//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use roomchat_common::{describe_backend_code, AppError, GENERIC_ERROR_MESSAGE};
use roomchat_core::DomainError;
use std::fmt;
use validator::ValidationErrors;

use crate::http::HttpError;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Domain rule violation or backend failure
    Domain(DomainError),

    /// Application error (auth, config, etc.)
    App(AppError),

    /// Resource not found
    NotFound { resource: &'static str, id: String },

    /// Local validation failure; nothing was sent
    Validation(String),

    /// Conflict (e.g., duplicate resource)
    Conflict(String),

    /// Quota exhausted for the current window
    RateLimited { retry_after_secs: i64 },

    /// No signed-in session
    NotAuthenticated,

    /// The request scope was cancelled before the call finished
    Cancelled,

    /// Third-party HTTP call failed
    Http(HttpError),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::App(e) => write!(f, "{e}"),
            Self::NotFound { resource, id } => write!(f, "{resource} not found: {id}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited, retry after {retry_after_secs}s")
            }
            Self::NotAuthenticated => write!(f, "Not authenticated"),
            Self::Cancelled => write!(f, "Request cancelled"),
            Self::Http(e) => write!(f, "{e}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(e) => Some(e),
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a not found error
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Raised locally, before any network call
    pub fn is_local(&self) -> bool {
        match self {
            Self::Validation(_) | Self::NotAuthenticated | Self::Cancelled => true,
            Self::Domain(e) => e.is_validation(),
            _ => false,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Stable error code
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Cancelled => "CANCELLED",
            Self::Http(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text for an alert
    ///
    /// Backend errors go through the known-code table; anything
    /// infrastructural falls back to the generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Domain(DomainError::Backend { code, .. }) => describe_backend_code(code).to_string(),
            Self::Domain(e) if !e.is_infrastructure() => e.to_string(),
            Self::App(e) => e.user_message(),
            Self::NotFound { resource, .. } => format!("{resource} could not be found."),
            Self::Validation(msg) | Self::Conflict(msg) => msg.clone(),
            Self::RateLimited { retry_after_secs } => format!(
                "You're sending messages too quickly. Try again in {retry_after_secs} seconds."
            ),
            Self::NotAuthenticated => "Please sign in to continue.".to_string(),
            Self::Cancelled => "The request was cancelled.".to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            other => Self::Domain(other),
        }
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Domain(e) => Self::from(e),
            AppError::NotAuthenticated => Self::NotAuthenticated,
            AppError::Validation(msg) => Self::Validation(msg),
            other => Self::App(other),
        }
    }
}

impl From<HttpError> for ServiceError {
    fn from(err: HttpError) -> Self {
        Self::Http(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        // First message is enough for an alert
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
                })
            })
            .next()
            .unwrap_or_else(|| "Invalid input".to_string());
        Self::Validation(message)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::NotFound { resource, id } => AppError::NotFound(format!("{resource} {id}")),
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::RateLimited { retry_after_secs } => {
                AppError::Domain(DomainError::RateLimited { retry_after_secs })
            }
            ServiceError::NotAuthenticated => AppError::NotAuthenticated,
            ServiceError::Cancelled => AppError::Internal(anyhow::anyhow!("request cancelled")),
            ServiceError::Http(e) => AppError::ExternalService(e.to_string()),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
