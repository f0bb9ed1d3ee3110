//! Backend service ports - auth, object storage, realtime

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::entities::{AuthUser, Profile, Session, StoredObject};
use crate::events::{ChangeEvent, Subscription};
use crate::traits::RepoResult;

/// Email/password authentication
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create the credential and its profile together, then sign in
    ///
    /// The backend assigns the account id; the new profile is returned with it.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> RepoResult<(Session, Profile)>;

    async fn sign_in(&self, email: &str, password: &str) -> RepoResult<Session>;

    /// Exchange a refresh token for a new session; the old token stops working
    async fn refresh(&self, refresh_token: &str) -> RepoResult<Session>;

    /// Revoke a refresh token; unknown tokens are ignored
    async fn sign_out(&self, refresh_token: &str) -> RepoResult<()>;

    /// Resolve the identity behind an access token
    async fn verify_access_token(&self, access_token: &str) -> RepoResult<AuthUser>;
}

/// Bucketed object storage
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Create a bucket; creating an existing bucket succeeds
    async fn create_bucket(&self, bucket: &str, public: bool) -> RepoResult<()>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RepoResult<StoredObject>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Stream of change events matching one subscription
pub type ChangeStream = BoxStream<'static, ChangeEvent>;

/// Source of realtime change events
#[async_trait]
pub trait RealtimeFeed: Send + Sync {
    /// Start receiving events matching `subscription`
    ///
    /// Dropping the stream ends the subscription.
    async fn subscribe(&self, subscription: Subscription) -> RepoResult<ChangeStream>;
}

/// Sink for change events
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    async fn publish(&self, event: &ChangeEvent) -> RepoResult<()>;
}
