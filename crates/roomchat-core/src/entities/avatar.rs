//! Avatar resolution with deterministic fallbacks

use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

const GENERATED_AVATAR_BASE: &str = "https://api.dicebear.com/7.x/initials/png?seed=";
const FALLBACK_AVATAR_BASE: &str = "https://ui-avatars.com/api/?name=";

/// Avatar URL to load first and the one to try when it fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarUrls {
    pub primary: String,
    pub fallback: String,
}

impl AvatarUrls {
    /// Stored URL when present, otherwise a URL generated from `username`
    pub fn resolve(stored: Option<&str>, username: &str) -> Self {
        let primary = stored
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map_or_else(|| generated_avatar_url(username), str::to_string);

        Self {
            primary,
            fallback: fallback_avatar_url(username),
        }
    }

    /// URL to use after the primary failed to load
    pub fn on_load_failure(&self) -> &str {
        &self.fallback
    }
}

/// Initials avatar seeded by username
pub fn generated_avatar_url(username: &str) -> String {
    format!("{GENERATED_AVATAR_BASE}{}", encode(username))
}

pub fn fallback_avatar_url(username: &str) -> String {
    format!("{FALLBACK_AVATAR_BASE}{}&background=random", encode(username))
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url_uses_generated() {
        let urls = AvatarUrls::resolve(None, "kim_01");
        assert_eq!(urls.primary, "https://api.dicebear.com/7.x/initials/png?seed=kim_01");
        assert_eq!(
            urls.on_load_failure(),
            "https://ui-avatars.com/api/?name=kim_01&background=random"
        );
    }

    #[test]
    fn test_blank_url_counts_as_missing() {
        let urls = AvatarUrls::resolve(Some("  "), "kim");
        assert_eq!(urls.primary, generated_avatar_url("kim"));
    }

    #[test]
    fn test_stored_url_wins() {
        let urls = AvatarUrls::resolve(Some("https://cdn.example/a.png"), "kim");
        assert_eq!(urls.primary, "https://cdn.example/a.png");
        assert_eq!(urls.fallback, fallback_avatar_url("kim"));
    }

    #[test]
    fn test_deterministic_and_encoded() {
        assert_eq!(generated_avatar_url("a b&c"), generated_avatar_url("a b&c"));
        assert!(generated_avatar_url("a b&c").ends_with("seed=a+b%26c"));
    }
}
