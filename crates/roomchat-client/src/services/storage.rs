//! Object storage service
//!
//! Applies the client-side upload allowlist before anything is sent.

use roomchat_core::validation::validate_upload;
use roomchat_core::StoredObject;
use tracing::{info, instrument};

use crate::dto::ImageUpload;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Storage service
pub struct StorageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StorageService<'a> {
    /// Create a new StorageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a bucket; an existing bucket is fine
    #[instrument(skip(self))]
    pub async fn ensure_bucket(&self, bucket: &str, public: bool) -> ServiceResult<()> {
        Ok(self.ctx.storage().create_bucket(bucket, public).await?)
    }

    /// Upload an image after checking size and type
    #[instrument(skip(self, upload), fields(size = upload.bytes.len()))]
    pub async fn upload_image(
        &self,
        bucket: &str,
        path: &str,
        upload: ImageUpload,
    ) -> ServiceResult<StoredObject> {
        let kind = validate_upload(upload.bytes.len(), &upload.content_type)?;
        if path.trim().is_empty() {
            return Err(ServiceError::validation("Upload path is required"));
        }

        let stored = self
            .ctx
            .storage()
            .upload(bucket, path, upload.bytes, kind.mime())
            .await?;

        info!(bucket, path, "Image uploaded");
        Ok(stored)
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.ctx.storage().public_url(bucket, path)
    }
}
