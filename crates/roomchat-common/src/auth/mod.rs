//! Authentication utilities

mod jwt;
mod password;
mod refresh;

pub use jwt::{Claims, IssuedToken, JwtService};
pub use password::{
    hash_password, validate_password_strength, verify_password, verify_password_or_reject,
    PASSWORD_MAX_CHARS, PASSWORD_MIN_CHARS,
};
pub use refresh::{generate_refresh_token, hash_refresh_token};
