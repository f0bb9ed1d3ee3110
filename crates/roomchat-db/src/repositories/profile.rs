//! PostgreSQL implementation of ProfileRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use roomchat_core::entities::Profile;
use roomchat_core::error::DomainError;
use roomchat_core::traits::{ProfileRepository, RepoResult};
use roomchat_core::value_objects::Snowflake;

use crate::models::ProfileModel;

use super::error::{map_db_error, map_unique_violation};

pub(super) const PROFILE_COLUMNS: &str = "id, username, display_name, avatar_url, role, status_message, \
                               push_token, created_at, updated_at";

/// PostgreSQL implementation of ProfileRepository
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    /// Create a new PgProfileRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape `%`, `_` and `\` so user input matches literally in LIKE
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Profile>> {
        let result = sqlx::query_as::<_, ProfileModel>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Profile::from))
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Profile>> {
        let result = sqlx::query_as::<_, ProfileModel>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Profile::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_many(&self, ids: &[Snowflake]) -> RepoResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();
        let results = sqlx::query_as::<_, ProfileModel>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Profile::from).collect())
    }

    #[instrument(skip(self))]
    async fn search_by_username(&self, prefix: &str, limit: i64) -> RepoResult<Vec<Profile>> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        let results = sqlx::query_as::<_, ProfileModel>(&format!(
            r"
            SELECT {PROFILE_COLUMNS}
            FROM profiles
            WHERE lower(username) LIKE $1 ESCAPE '\'
            ORDER BY username
            LIMIT $2
            "
        ))
        .bind(pattern)
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Profile::from).collect())
    }

    #[instrument(skip(self))]
    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM profiles WHERE username = $1)
            ",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, profile), fields(profile_id = %profile.id))]
    async fn create(&self, profile: &Profile) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (id, username, display_name, avatar_url, role, status_message,
                                  push_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(profile.id.into_inner())
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(profile.role.as_str())
        .bind(&profile.status_message)
        .bind(&profile.push_token)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| DomainError::UsernameTaken))?;

        Ok(())
    }

    #[instrument(skip(self, profile), fields(profile_id = %profile.id))]
    async fn update(&self, profile: &Profile) -> RepoResult<()> {
        // role and push_token are owned by other flows
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET username = $2, display_name = $3, avatar_url = $4, status_message = $5,
                updated_at = $6
            WHERE id = $1
            ",
        )
        .bind(profile.id.into_inner())
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(&profile.status_message)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| DomainError::UsernameTaken))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProfileNotFound(profile.id));
        }

        Ok(())
    }
}
