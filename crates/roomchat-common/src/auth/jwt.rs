//! Access tokens
//!
//! Short-lived HS256 JWTs carrying the user id and email. Refresh tokens are
//! opaque (see [`super::refresh`]).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use roomchat_core::{AuthUser, Snowflake};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Always "authenticated" for signed-in users
    pub role: String,
}

impl Claims {
    /// Get the user ID as a Snowflake
    ///
    /// # Errors
    /// Returns an error if the subject cannot be parsed as a Snowflake
    pub fn user_id(&self) -> Result<Snowflake, AppError> {
        Snowflake::parse(&self.sub).map_err(|_| AppError::InvalidToken)
    }

    pub fn auth_user(&self) -> Result<AuthUser, AppError> {
        Ok(AuthUser {
            id: self.user_id()?,
            email: self.email.clone(),
        })
    }
}

/// Access token and when it stops being accepted
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT service for encoding and decoding access tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl JwtService {
    /// Create a new JWT service; expiries are in seconds
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64, refresh_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
            refresh_token_expiry,
        }
    }

    /// Lifetime of refresh tokens issued alongside access tokens
    #[must_use]
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_expiry)
    }

    /// Issue an access token for a user
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_access_token(&self, user_id: Snowflake, email: &str) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            role: "authenticated".to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode JWT: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Decode and validate an access token
    ///
    /// # Errors
    /// Returns an error if the token is invalid or expired
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            }
        })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}
