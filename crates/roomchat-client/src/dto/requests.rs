//! Request DTOs for service calls
//!
//! Field-level rules use `validator`; username, content, color and upload
//! rules live in `roomchat_core::validation`.

use roomchat_core::Snowflake;
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Auth Requests
// ============================================================================

/// Email/password sign-up
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// 8-72 characters, checked by `validate_password_strength`
    pub password: String,

    pub username: String,
}

/// Email/password sign-in
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// ============================================================================
// Profile Requests
// ============================================================================

/// Partial profile update; `Some("")` clears a field
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50, message = "Display name must be at most 50 characters"))]
    pub display_name: Option<String>,

    #[validate(length(max = 150, message = "Status message must be at most 150 characters"))]
    pub status_message: Option<String>,
}

// ============================================================================
// Message Requests
// ============================================================================

/// New chatroom message
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,

    /// `#RRGGBB`
    #[serde(default)]
    pub bubble_color: Option<String>,
}

impl SendMessageRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bubble_color: None,
        }
    }
}

/// New direct message
#[derive(Debug, Clone, Deserialize)]
pub struct SendDirectMessageRequest {
    pub receiver_id: Snowflake,
    pub content: String,
}

// ============================================================================
// Upload Requests
// ============================================================================

/// Image bytes picked by the user
#[derive(Clone, Deserialize)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("size", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}
