//! PostgreSQL implementation of AuthProvider
//!
//! Credentials live in `auth_users`, refresh tokens in `refresh_tokens`
//! (stored as SHA-256 hashes). Access tokens are stateless JWTs.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};

use roomchat_common::{
    generate_refresh_token, hash_password, hash_refresh_token, verify_password_or_reject,
    JwtService,
};
use roomchat_core::entities::{AuthUser, Profile, Session};
use roomchat_core::error::DomainError;
use roomchat_core::traits::{AuthProvider, RepoResult};
use roomchat_core::value_objects::Snowflake;

use crate::models::{AuthUserModel, ProfileModel, RefreshTokenModel};

use super::error::{map_app_error, map_db_error, map_unique_violation};
use super::profile::PROFILE_COLUMNS;

/// PostgreSQL implementation of AuthProvider
#[derive(Clone)]
pub struct PgAuthProvider {
    pool: PgPool,
    jwt: JwtService,
}

impl PgAuthProvider {
    /// Create a new PgAuthProvider
    pub fn new(pool: PgPool, jwt: JwtService) -> Self {
        Self { pool, jwt }
    }

    /// Store a fresh refresh token and pair it with an access token
    async fn issue_session(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Snowflake,
        email: &str,
    ) -> RepoResult<Session> {
        let refresh_token = generate_refresh_token();
        let expires_at = Utc::now() + self.jwt.refresh_token_ttl();

        sqlx::query(
            r"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id.into_inner())
        .bind(hash_refresh_token(&refresh_token))
        .bind(expires_at)
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;

        let access = self
            .jwt
            .issue_access_token(user_id, email)
            .map_err(map_app_error)?;

        Ok(Session::bearer(
            user_id,
            access.token,
            refresh_token,
            access.expires_at,
        ))
    }
}

#[async_trait]
impl AuthProvider for PgAuthProvider {
    #[instrument(skip(self, email, password))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> RepoResult<(Session, Profile)> {
        let password_hash = hash_password(password).map_err(map_app_error)?;
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO auth_users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, |_| DomainError::EmailAlreadyExists))?;

        let profile = sqlx::query_as::<_, ProfileModel>(&format!(
            r"
            INSERT INTO profiles (id, username)
            VALUES ($1, $2)
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(username)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, |_| DomainError::UsernameTaken))?;
        let profile = Profile::from(profile);

        let session = self.issue_session(&mut tx, profile.id, email).await?;
        tx.commit().await.map_err(map_db_error)?;

        info!(user_id = %profile.id, "account created");
        Ok((session, profile))
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> RepoResult<Session> {
        let user = sqlx::query_as::<_, AuthUserModel>(
            r"
            SELECT id, email, password_hash, created_at
            FROM auth_users
            WHERE lower(email) = lower($1)
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or(DomainError::InvalidCredentials)?;

        verify_password_or_reject(password, &user.password_hash).map_err(map_app_error)?;

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let session = self
            .issue_session(&mut tx, Snowflake::new(user.id), &user.email)
            .await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(session)
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> RepoResult<Session> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let stored = sqlx::query_as::<_, RefreshTokenModel>(
            r"
            SELECT id, user_id, token_hash, expires_at, created_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            FOR UPDATE
            ",
        )
        .bind(hash_refresh_token(refresh_token))
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?
        .ok_or(DomainError::InvalidSession)?;

        if !stored.is_usable(now) {
            warn!(user_id = stored.user_id, "refresh with revoked or expired token");
            return Err(DomainError::InvalidSession);
        }

        sqlx::query(
            r"
            UPDATE refresh_tokens SET revoked_at = $2 WHERE id = $1
            ",
        )
        .bind(stored.id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let email = sqlx::query_scalar::<_, String>(
            r"
            SELECT email FROM auth_users WHERE id = $1
            ",
        )
        .bind(stored.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let session = self
            .issue_session(&mut tx, Snowflake::new(stored.user_id), &email)
            .await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(session)
    }

    #[instrument(skip(self, refresh_token))]
    async fn sign_out(&self, refresh_token: &str) -> RepoResult<()> {
        sqlx::query(
            r"
            UPDATE refresh_tokens
            SET revoked_at = now()
            WHERE token_hash = $1 AND revoked_at IS NULL
            ",
        )
        .bind(hash_refresh_token(refresh_token))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn verify_access_token(&self, access_token: &str) -> RepoResult<AuthUser> {
        self.jwt
            .validate_access_token(access_token)
            .and_then(|claims| claims.auth_user())
            .map_err(map_app_error)
    }
}
