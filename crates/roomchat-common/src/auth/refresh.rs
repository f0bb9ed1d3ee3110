//! Opaque refresh tokens
//!
//! Only the SHA-256 digest is stored, so a leaked table cannot be replayed.

use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const REFRESH_TOKEN_LEN: usize = 48;

/// Random URL-safe refresh token
#[must_use]
pub fn generate_refresh_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Hex SHA-256 of a refresh token, as stored
#[must_use]
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_differ() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), REFRESH_TOKEN_LEN);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = hash_refresh_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash, hash_refresh_token("abc"));
    }
}
