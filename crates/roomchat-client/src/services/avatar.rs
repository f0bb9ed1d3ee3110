//! Avatar lookup and upload
//!
//! Resolved URLs are cached per session in [`AvatarCache`].

use dashmap::DashMap;
use roomchat_core::entities::{avatar_object_path, AVATAR_BUCKET};
use roomchat_core::validation::validate_upload;
use roomchat_core::{AvatarUrls, Profile, Snowflake};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::dto::ImageUpload;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::profile::ProfileService;

/// Session-scoped cache of resolved avatar URLs
#[derive(Debug, Default)]
pub struct AvatarCache {
    entries: DashMap<Snowflake, AvatarUrls>,
}

impl AvatarCache {
    pub fn get(&self, user_id: Snowflake) -> Option<AvatarUrls> {
        self.entries.get(&user_id).map(|e| e.value().clone())
    }

    pub fn insert(&self, user_id: Snowflake, urls: AvatarUrls) {
        self.entries.insert(user_id, urls);
    }

    pub fn invalidate(&self, user_id: Snowflake) {
        self.entries.remove(&user_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Avatar service
pub struct AvatarService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AvatarService<'a> {
    /// Create a new AvatarService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Avatar URLs for a user: stored URL or a username-seeded one, plus a fallback
    #[instrument(skip(self))]
    pub async fn resolve(&self, user_id: Snowflake) -> ServiceResult<AvatarUrls> {
        let cache = self.ctx.session().avatars();
        if let Some(urls) = cache.get(user_id) {
            return Ok(urls);
        }

        let profile = ProfileService::new(self.ctx).get_profile(user_id).await?;
        let urls = AvatarUrls::resolve(profile.avatar_url.as_deref(), &profile.username);

        debug!(user_id = %user_id, "Avatar resolved");
        cache.insert(user_id, urls.clone());
        Ok(urls)
    }

    /// Store a new avatar image and point the profile at it
    #[instrument(skip(self, upload), fields(size = upload.bytes.len()))]
    pub async fn upload_avatar(&self, user_id: Snowflake, upload: ImageUpload) -> ServiceResult<Profile> {
        let kind = validate_upload(upload.bytes.len(), &upload.content_type)?;

        let storage = self.ctx.storage();
        storage.create_bucket(AVATAR_BUCKET, true).await?;

        let path = avatar_object_path(user_id, &Uuid::new_v4().to_string(), kind);
        let stored = storage
            .upload(AVATAR_BUCKET, &path, upload.bytes, kind.mime())
            .await?;

        let mut profile = ProfileService::new(self.ctx).get_profile(user_id).await?;
        profile.set_avatar_url(Some(stored.public_url));
        self.ctx.profiles().update(&profile).await?;

        self.ctx.session().avatars().invalidate(user_id);
        info!(user_id = %user_id, path = %path, "Avatar uploaded");

        Ok(profile)
    }
}
