//! Auth session held by the client

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Signed-in session: short-lived access token plus a rotating refresh token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Snowflake,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
}

impl Session {
    pub fn bearer(
        user_id: Snowflake,
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            access_token,
            refresh_token,
            expires_at,
            token_type: "Bearer".to_string(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when the access token expires within `margin` of `now`
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// Identity behind a verified access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Snowflake,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let session = Session::bearer(
            Snowflake::new(1),
            "access".to_string(),
            "refresh".to_string(),
            now + Duration::minutes(10),
        );
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::minutes(10)));
        assert!(session.expires_within(now, Duration::minutes(15)));
        assert!(!session.expires_within(now, Duration::minutes(5)));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let session = Session::bearer(
            Snowflake::new(1),
            "secret-access".to_string(),
            "secret-refresh".to_string(),
            Utc::now(),
        );
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
    }
}
