//! Object storage records

use serde::{Deserialize, Serialize};

use crate::validation::ImageKind;
use crate::value_objects::Snowflake;

/// Bucket holding profile pictures
pub const AVATAR_BUCKET: &str = "avatars";

/// An uploaded object and where it can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub size: u64,
    pub public_url: String,
}

/// Path of a new avatar inside [`AVATAR_BUCKET`]: `{user_id}/{name}.{ext}`
pub fn avatar_object_path(user_id: Snowflake, name: &str, kind: ImageKind) -> String {
    format!("{user_id}/{name}.{}", kind.extension())
}
