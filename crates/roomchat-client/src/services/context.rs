//! Service context - dependency container for services
//!
//! Holds the backend ports, HTTP integrations, and session state needed by services.

use std::sync::Arc;

use roomchat_core::traits::{
    AuthProvider, ChatroomRepository, DirectMessageRepository, MembershipRepository,
    MessageRepository, ObjectStorage, ProfileRepository, RateLimitRepository, RealtimeFeed,
};
use roomchat_core::RateLimitPolicy;

use crate::http::{ImageSearchClient, PushClient};
use crate::session::SessionStore;

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct ServiceContext {
    // Relational ports
    profiles: Arc<dyn ProfileRepository>,
    chatrooms: Arc<dyn ChatroomRepository>,
    memberships: Arc<dyn MembershipRepository>,
    messages: Arc<dyn MessageRepository>,
    direct_messages: Arc<dyn DirectMessageRepository>,
    rate_limits: Arc<dyn RateLimitRepository>,

    // Backend services
    auth: Arc<dyn AuthProvider>,
    storage: Arc<dyn ObjectStorage>,
    realtime: Arc<dyn RealtimeFeed>,

    // HTTP integrations
    push: Option<PushClient>,
    images: Option<ImageSearchClient>,

    send_policy: RateLimitPolicy,
    session: Arc<SessionStore>,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Ports ===

    pub fn profiles(&self) -> &dyn ProfileRepository {
        self.profiles.as_ref()
    }

    pub fn chatrooms(&self) -> &dyn ChatroomRepository {
        self.chatrooms.as_ref()
    }

    pub fn memberships(&self) -> &dyn MembershipRepository {
        self.memberships.as_ref()
    }

    pub fn messages(&self) -> &dyn MessageRepository {
        self.messages.as_ref()
    }

    pub fn direct_messages(&self) -> &dyn DirectMessageRepository {
        self.direct_messages.as_ref()
    }

    pub fn rate_limits(&self) -> &dyn RateLimitRepository {
        self.rate_limits.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    pub fn storage(&self) -> &dyn ObjectStorage {
        self.storage.as_ref()
    }

    pub fn realtime(&self) -> &dyn RealtimeFeed {
        self.realtime.as_ref()
    }

    // === HTTP ===

    /// Push relay, if configured
    pub fn push(&self) -> Option<&PushClient> {
        self.push.as_ref()
    }

    /// Image search, if configured
    pub fn images(&self) -> Option<&ImageSearchClient> {
        self.images.as_ref()
    }

    // === Session & policy ===

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Quota applied to message and direct-message sends
    pub fn send_policy(&self) -> &RateLimitPolicy {
        &self.send_policy
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("ports", &"...")
            .field("push", &self.push.is_some())
            .field("images", &self.images.is_some())
            .field("send_policy", &self.send_policy)
            .field("session", &self.session)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    profiles: Option<Arc<dyn ProfileRepository>>,
    chatrooms: Option<Arc<dyn ChatroomRepository>>,
    memberships: Option<Arc<dyn MembershipRepository>>,
    messages: Option<Arc<dyn MessageRepository>>,
    direct_messages: Option<Arc<dyn DirectMessageRepository>>,
    rate_limits: Option<Arc<dyn RateLimitRepository>>,
    auth: Option<Arc<dyn AuthProvider>>,
    storage: Option<Arc<dyn ObjectStorage>>,
    realtime: Option<Arc<dyn RealtimeFeed>>,
    push: Option<PushClient>,
    images: Option<ImageSearchClient>,
    send_policy: RateLimitPolicy,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one backend for every relational port and backend service
    pub fn backend<B>(self, backend: B) -> Self
    where
        B: ProfileRepository
            + ChatroomRepository
            + MembershipRepository
            + MessageRepository
            + DirectMessageRepository
            + RateLimitRepository
            + AuthProvider
            + ObjectStorage
            + RealtimeFeed
            + 'static,
    {
        let backend = Arc::new(backend);
        self.profiles(backend.clone())
            .chatrooms(backend.clone())
            .memberships(backend.clone())
            .messages(backend.clone())
            .direct_messages(backend.clone())
            .rate_limits(backend.clone())
            .auth(backend.clone())
            .storage(backend.clone())
            .realtime(backend)
    }

    pub fn profiles(mut self, repo: Arc<dyn ProfileRepository>) -> Self {
        self.profiles = Some(repo);
        self
    }

    pub fn chatrooms(mut self, repo: Arc<dyn ChatroomRepository>) -> Self {
        self.chatrooms = Some(repo);
        self
    }

    pub fn memberships(mut self, repo: Arc<dyn MembershipRepository>) -> Self {
        self.memberships = Some(repo);
        self
    }

    pub fn messages(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.messages = Some(repo);
        self
    }

    pub fn direct_messages(mut self, repo: Arc<dyn DirectMessageRepository>) -> Self {
        self.direct_messages = Some(repo);
        self
    }

    pub fn rate_limits(mut self, repo: Arc<dyn RateLimitRepository>) -> Self {
        self.rate_limits = Some(repo);
        self
    }

    pub fn auth(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(provider);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn realtime(mut self, feed: Arc<dyn RealtimeFeed>) -> Self {
        self.realtime = Some(feed);
        self
    }

    pub fn push(mut self, client: PushClient) -> Self {
        self.push = Some(client);
        self
    }

    pub fn images(mut self, client: ImageSearchClient) -> Self {
        self.images = Some(client);
        self
    }

    pub fn send_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.send_policy = policy;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Internal` naming the first missing port
    pub fn build(self) -> ServiceResult<ServiceContext> {
        fn required<T>(value: Option<T>, name: &str) -> ServiceResult<T> {
            value.ok_or_else(|| ServiceError::internal(format!("{name} is required")))
        }

        Ok(ServiceContext {
            profiles: required(self.profiles, "profiles")?,
            chatrooms: required(self.chatrooms, "chatrooms")?,
            memberships: required(self.memberships, "memberships")?,
            messages: required(self.messages, "messages")?,
            direct_messages: required(self.direct_messages, "direct_messages")?,
            rate_limits: required(self.rate_limits, "rate_limits")?,
            auth: required(self.auth, "auth")?,
            storage: required(self.storage, "storage")?,
            realtime: required(self.realtime, "realtime")?,
            push: self.push,
            images: self.images,
            send_policy: self.send_policy,
            session: Arc::new(SessionStore::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_port_is_reported() {
        let err = ServiceContext::builder().build().unwrap_err();
        assert!(err.to_string().contains("profiles is required"));
    }
}
