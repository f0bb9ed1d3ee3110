use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Image formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    pub const fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// Size and MIME allowlist check
pub fn validate_upload(size: usize, mime: &str) -> Result<ImageKind, DomainError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(DomainError::FileTooLarge {
            max_bytes: MAX_UPLOAD_BYTES,
        });
    }
    ImageKind::from_mime(mime).ok_or_else(|| DomainError::UnsupportedMediaType(mime.to_string()))
}
