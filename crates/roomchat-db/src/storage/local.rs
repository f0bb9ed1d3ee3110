//! Filesystem-backed object storage
//!
//! Buckets are directories under `root`; objects are files. Public URLs are
//! `{public_base_url}/{bucket}/{path}`, served by whatever fronts the
//! directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use roomchat_common::StorageConfig;
use roomchat_core::entities::StoredObject;
use roomchat_core::error::DomainError;
use roomchat_core::traits::{ObjectStorage, RepoResult};

/// Object storage rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.upload_dir, &config.public_base_url)
    }

    /// Resolve `bucket/path` under the root, refusing anything that escapes it
    fn resolve(&self, bucket: &str, path: &str) -> RepoResult<PathBuf> {
        let mut resolved = self.bucket_dir(bucket)?;
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(DomainError::StorageError(format!(
                        "invalid object path: {path}"
                    )))
                }
            }
        }
        if resolved == self.bucket_dir(bucket)? {
            return Err(DomainError::StorageError("empty object path".to_string()));
        }
        Ok(resolved)
    }

    fn bucket_dir(&self, bucket: &str) -> RepoResult<PathBuf> {
        let valid = !bucket.is_empty()
            && bucket
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DomainError::StorageError(format!("invalid bucket name: {bucket}")));
        }
        Ok(self.root.join(bucket))
    }
}

fn storage_error(e: std::io::Error) -> DomainError {
    DomainError::StorageError(e.to_string())
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    #[instrument(skip(self))]
    async fn create_bucket(&self, bucket: &str, _public: bool) -> RepoResult<()> {
        let dir = self.bucket_dir(bucket)?;
        tokio::fs::create_dir_all(&dir).await.map_err(storage_error)
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RepoResult<StoredObject> {
        if !tokio::fs::try_exists(self.bucket_dir(bucket)?)
            .await
            .map_err(storage_error)?
        {
            return Err(DomainError::StorageError(format!("bucket not found: {bucket}")));
        }

        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
        }

        let size = bytes.len() as u64;
        tokio::fs::write(&target, bytes).await.map_err(storage_error)?;
        debug!(path = %target.display(), "object stored");

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content_type: content_type.to_string(),
            size,
            public_url: self.public_url(bucket, path),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{bucket}/{}", self.public_base_url, path.trim_start_matches('/'))
    }
}
