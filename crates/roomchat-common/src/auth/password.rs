//! Password hashing and verification utilities
//!
//! Uses Argon2id for password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AppError;

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 72;

/// Hash a password using Argon2id
///
/// # Errors
/// Returns an error if hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))
}

/// Verify a password against a hash
///
/// # Errors
/// Returns an error if the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Verify a password and map a mismatch to `InvalidCredentials`
///
/// # Errors
/// Returns `AppError::InvalidCredentials` if the password doesn't match
pub fn verify_password_or_reject(password: &str, hash: &str) -> Result<(), AppError> {
    if verify_password(password, hash)? {
        Ok(())
    } else {
        Err(AppError::InvalidCredentials)
    }
}

/// Password length rule: 8-72 characters
///
/// # Errors
/// Returns a validation error describing the violated bound
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_CHARS} characters long"
        )));
    }
    if len > PASSWORD_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at most {PASSWORD_MAX_CHARS} characters long"
        )));
    }
    Ok(())
}
