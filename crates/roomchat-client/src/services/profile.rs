//! Profile service
//!
//! Lookups, partial updates, username changes, and username search.

use roomchat_core::validation::validate_username;
use roomchat_core::{DomainError, Profile, ProfileChanges, Snowflake};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::UpdateProfileRequest;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Upper bound on username search results
pub const MAX_SEARCH_RESULTS: i64 = 20;

/// Profile service
pub struct ProfileService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProfileService<'a> {
    /// Create a new ProfileService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Get profile by ID
    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Snowflake) -> ServiceResult<Profile> {
        self.ctx
            .profiles()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::ProfileNotFound(user_id).into())
    }

    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> ServiceResult<Profile> {
        self.ctx
            .profiles()
            .find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile", username))
    }

    /// Batch lookup; unknown ids are skipped
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn get_profiles(&self, ids: &[Snowflake]) -> ServiceResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.ctx.profiles().find_many(ids).await?)
    }

    /// Update display name and status message
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: Snowflake,
        request: UpdateProfileRequest,
    ) -> ServiceResult<Profile> {
        request.validate()?;

        let changes = ProfileChanges {
            display_name: request.display_name,
            status_message: request.status_message,
        };
        let mut profile = self.get_profile(user_id).await?;
        if changes.is_empty() {
            return Ok(profile);
        }

        profile.apply(changes);
        self.ctx.profiles().update(&profile).await?;

        info!(user_id = %user_id, "Profile updated");
        Ok(profile)
    }

    /// Change username; a taken name is a conflict
    #[instrument(skip(self))]
    pub async fn change_username(&self, user_id: Snowflake, username: &str) -> ServiceResult<Profile> {
        validate_username(username)?;

        let mut profile = self.get_profile(user_id).await?;
        if profile.username == username {
            return Ok(profile);
        }

        // Pre-check gives a friendly error; the unique constraint still decides races
        if self.ctx.profiles().username_exists(username).await? {
            return Err(ServiceError::conflict("Username is already taken"));
        }

        profile.set_username(username.to_string());
        self.ctx.profiles().update(&profile).await.map_err(|e| match e {
            DomainError::UsernameTaken => ServiceError::conflict("Username is already taken"),
            other => other.into(),
        })?;

        // Generated avatars are seeded by username
        self.ctx.session().avatars().invalidate(user_id);

        info!(user_id = %user_id, "Username changed");
        Ok(profile)
    }

    /// Profiles whose username starts with `prefix`
    #[instrument(skip(self))]
    pub async fn search(&self, prefix: &str, limit: i64) -> ServiceResult<Vec<Profile>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .ctx
            .profiles()
            .search_by_username(prefix, limit.clamp(1, MAX_SEARCH_RESULTS))
            .await?)
    }
}
