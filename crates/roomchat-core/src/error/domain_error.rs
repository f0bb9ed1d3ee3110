//! Domain errors - error types for the domain layer and backend ports

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Profile not found: {0}")]
    ProfileNotFound(Snowflake),

    #[error("Chatroom not found: {0}")]
    ChatroomNotFound(Snowflake),

    #[error("Region not found: {0}")]
    RegionNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    #[error("Direct message not found: {0}")]
    DirectMessageNotFound(Snowflake),

    #[error("Not a member of this chatroom")]
    MembershipNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Message cannot be empty")]
    ContentEmpty,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Invalid bubble color: {0}")]
    InvalidBubbleColor(String),

    #[error("File too large: max {max_bytes} bytes")]
    FileTooLarge { max_bytes: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session is invalid or has expired")]
    InvalidSession,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not message author")]
    NotMessageAuthor,

    #[error("Not a member of chatroom {0}")]
    NotChatroomMember(Snowflake),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already in use")]
    EmailAlreadyExists,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Chatroom is not active")]
    ChatroomInactive,

    #[error("Chatroom is full ({max} members)")]
    ChatroomFull { max: i32 },

    #[error("Too many messages, try again in {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    #[error("Cannot send a direct message to yourself")]
    CannotMessageSelf,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    /// Error reported by the database, with its SQLSTATE (or platform) code
    #[error("Backend error {code}: {message}")]
    Backend { code: String, message: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Realtime error: {0}")]
    RealtimeError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::ProfileNotFound(_) => "UNKNOWN_PROFILE",
            Self::ChatroomNotFound(_) => "UNKNOWN_CHATROOM",
            Self::RegionNotFound(_) => "UNKNOWN_REGION",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::DirectMessageNotFound(_) => "UNKNOWN_DIRECT_MESSAGE",
            Self::MembershipNotFound => "UNKNOWN_MEMBERSHIP",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidUsername(_) => "INVALID_USERNAME",
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::ContentEmpty => "CONTENT_EMPTY",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidBubbleColor(_) => "INVALID_BUBBLE_COLOR",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",

            // Authentication
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidSession => "INVALID_SESSION",

            // Authorization
            Self::NotMessageAuthor => "NOT_MESSAGE_AUTHOR",
            Self::NotChatroomMember(_) => "NOT_CHATROOM_MEMBER",
            Self::Forbidden(_) => "FORBIDDEN",

            // Conflict
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",

            // Business Rules
            Self::ChatroomInactive => "CHATROOM_INACTIVE",
            Self::ChatroomFull { .. } => "CHATROOM_FULL",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::CannotMessageSelf => "CANNOT_MESSAGE_SELF",

            // Infrastructure
            Self::Backend { .. } => "BACKEND_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::RealtimeError(_) => "REALTIME_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound(_)
                | Self::ChatroomNotFound(_)
                | Self::RegionNotFound(_)
                | Self::MessageNotFound(_)
                | Self::DirectMessageNotFound(_)
                | Self::MembershipNotFound
        )
    }

    /// Check if this is a validation error (raised locally, never reaches the network)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidEmail
                | Self::InvalidUsername(_)
                | Self::WeakPassword(_)
                | Self::ContentEmpty
                | Self::ContentTooLong { .. }
                | Self::InvalidBubbleColor(_)
                | Self::FileTooLarge { .. }
                | Self::UnsupportedMediaType(_)
                | Self::CannotMessageSelf
        )
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::InvalidSession)
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::NotMessageAuthor | Self::NotChatroomMember(_) | Self::Forbidden(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::UsernameTaken | Self::EmailAlreadyExists)
    }

    /// Check if this came from infrastructure rather than a domain rule
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Backend { .. }
                | Self::DatabaseError(_)
                | Self::CacheError(_)
                | Self::StorageError(_)
                | Self::RealtimeError(_)
                | Self::InternalError(_)
        )
    }

    /// Build a backend error from a code and message
    pub fn backend(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            code: code.into(),
            message: message.into(),
        }
    }
}
