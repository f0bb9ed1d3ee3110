//! Auth port for the in-memory backend

use async_trait::async_trait;
use chrono::Utc;

use roomchat_common::{
    generate_refresh_token, hash_password, hash_refresh_token, verify_password_or_reject,
};
use roomchat_core::entities::{AuthUser, Profile, Session};
use roomchat_core::error::DomainError;
use roomchat_core::events::Table;
use roomchat_core::traits::{AuthProvider, RepoResult};
use roomchat_core::value_objects::Snowflake;

use super::{insert_event, public_profile, Credential, MemoryBackend, RefreshRecord, State};
use crate::repositories::map_app_error;

impl MemoryBackend {
    /// Record a refresh token for `user_id` and pair it with an access token
    fn issue_session(&self, state: &mut State, user_id: Snowflake, email: &str) -> RepoResult<Session> {
        let access = self
            .jwt
            .issue_access_token(user_id, email)
            .map_err(map_app_error)?;
        let refresh_token = generate_refresh_token();
        state.refresh_tokens.insert(
            hash_refresh_token(&refresh_token),
            RefreshRecord {
                user_id,
                expires_at: Utc::now() + self.jwt.refresh_token_ttl(),
                revoked: false,
            },
        );
        Ok(Session::bearer(
            user_id,
            access.token,
            refresh_token,
            access.expires_at,
        ))
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> RepoResult<(Session, Profile)> {
        let password_hash = hash_password(password).map_err(map_app_error)?;

        let (session, profile, event) = self.with_state(|s| {
            if s.emails.contains_key(&email.to_lowercase()) {
                return Err(DomainError::EmailAlreadyExists);
            }
            if s.profiles.values().any(|p| p.username == username) {
                return Err(DomainError::UsernameTaken);
            }
            let profile = Profile::new(self.ids.generate(), username.to_string());
            s.emails.insert(email.to_lowercase(), profile.id);
            s.credentials.insert(
                profile.id,
                Credential {
                    email: email.to_string(),
                    password_hash,
                },
            );
            s.profiles.insert(profile.id, profile.clone());
            let session = self.issue_session(s, profile.id, email)?;
            let event = insert_event(Table::Profiles, &public_profile(&profile));
            Ok((session, profile, event))
        })?;

        self.emit(event);
        Ok((session, profile))
    }

    async fn sign_in(&self, email: &str, password: &str) -> RepoResult<Session> {
        let (user_id, credential) = self
            .with_state(|s| {
                let id = *s.emails.get(&email.to_lowercase())?;
                s.credentials.get(&id).cloned().map(|c| (id, c))
            })
            .ok_or(DomainError::InvalidCredentials)?;

        // Verify outside the lock; hashing is slow
        verify_password_or_reject(password, &credential.password_hash).map_err(map_app_error)?;

        self.with_state(|s| self.issue_session(s, user_id, &credential.email))
    }

    async fn refresh(&self, refresh_token: &str) -> RepoResult<Session> {
        let hash = hash_refresh_token(refresh_token);
        let now = Utc::now();

        self.with_state(|s| {
            let record = s
                .refresh_tokens
                .get_mut(&hash)
                .filter(|r| !r.revoked && now < r.expires_at)
                .ok_or(DomainError::InvalidSession)?;
            record.revoked = true;
            let user_id = record.user_id;
            let email = s
                .credentials
                .get(&user_id)
                .map(|c| c.email.clone())
                .ok_or(DomainError::InvalidSession)?;
            self.issue_session(s, user_id, &email)
        })
    }

    async fn sign_out(&self, refresh_token: &str) -> RepoResult<()> {
        let hash = hash_refresh_token(refresh_token);
        self.with_state(|s| {
            if let Some(record) = s.refresh_tokens.get_mut(&hash) {
                record.revoked = true;
            }
        });
        Ok(())
    }

    async fn verify_access_token(&self, access_token: &str) -> RepoResult<AuthUser> {
        self.jwt
            .validate_access_token(access_token)
            .and_then(|claims| claims.auth_user())
            .map_err(map_app_error)
    }
}
