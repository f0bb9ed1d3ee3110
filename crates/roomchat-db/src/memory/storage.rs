//! Object storage port for the in-memory backend

use async_trait::async_trait;

use roomchat_core::entities::StoredObject;
use roomchat_core::error::DomainError;
use roomchat_core::traits::{ObjectStorage, RepoResult};

use super::{MemoryBackend, StoredBlob};

#[async_trait]
impl ObjectStorage for MemoryBackend {
    async fn create_bucket(&self, bucket: &str, _public: bool) -> RepoResult<()> {
        self.with_state(|s| s.buckets.insert(bucket.to_string()));
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RepoResult<StoredObject> {
        let size = bytes.len() as u64;
        self.with_state(|s| {
            if !s.buckets.contains(bucket) {
                return Err(DomainError::StorageError(format!("bucket not found: {bucket}")));
            }
            s.objects.insert(
                (bucket.to_string(), path.to_string()),
                StoredBlob {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );
            Ok(())
        })?;

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content_type: content_type.to_string(),
            size,
            public_url: self.public_url(bucket, path),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{bucket}/{path}", self.public_base_url)
    }
}

impl MemoryBackend {
    /// Content type recorded for a stored object
    pub fn object_content_type(&self, bucket: &str, path: &str) -> Option<String> {
        self.with_state(|s| {
            s.objects
                .get(&(bucket.to_string(), path.to_string()))
                .map(|blob| blob.content_type.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_backend;
    use super::*;

    #[tokio::test]
    async fn test_upload_into_existing_bucket() {
        let backend = test_backend().with_public_base_url("http://files.test/");
        backend.create_bucket("avatars", true).await.unwrap();
        backend.create_bucket("avatars", true).await.unwrap();

        let object = backend
            .upload("avatars", "1/a.png", vec![9; 4], "image/png")
            .await
            .unwrap();
        assert_eq!(object.public_url, "http://files.test/avatars/1/a.png");
        assert_eq!(backend.object_bytes("avatars", "1/a.png"), Some(vec![9; 4]));
        assert_eq!(
            backend.object_content_type("avatars", "1/a.png").as_deref(),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn test_upload_into_missing_bucket_fails() {
        let backend = test_backend();
        let result = backend.upload("nope", "a.png", vec![], "image/png").await;
        assert!(matches!(result, Err(DomainError::StorageError(_))));
    }
}
