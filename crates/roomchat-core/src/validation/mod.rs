//! Local validation rules
//!
//! Everything here runs before any network call; a failure never reaches
//! the backend.

mod content;
mod upload;
mod username;

pub use content::{
    escape_html, unescape_html, validate_bubble_color, validate_content, MAX_CONTENT_CHARS,
};
pub use upload::{validate_upload, ImageKind, MAX_UPLOAD_BYTES};
pub use username::{validate_username, USERNAME_MAX_CHARS, USERNAME_MIN_CHARS};
