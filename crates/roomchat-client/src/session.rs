//! Signed-in session state owned by a client instance

use parking_lot::RwLock;
use roomchat_core::{Session, Snowflake};

use crate::services::avatar::AvatarCache;
use crate::services::{ServiceError, ServiceResult};

/// Current session plus the caches scoped to it
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    avatars: AvatarCache,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// Signed-in user id, or `NotAuthenticated`
    pub fn user_id(&self) -> ServiceResult<Snowflake> {
        self.current
            .read()
            .as_ref()
            .map(|s| s.user_id)
            .ok_or(ServiceError::NotAuthenticated)
    }

    pub fn refresh_token(&self) -> ServiceResult<String> {
        self.current
            .read()
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(ServiceError::NotAuthenticated)
    }

    /// Replace the session; switching users drops cached lookups
    pub fn set(&self, session: Session) {
        let mut current = self.current.write();
        if current.as_ref().is_some_and(|s| s.user_id != session.user_id) {
            self.avatars.clear();
        }
        *current = Some(session);
    }

    /// Forget the session and everything cached under it
    pub fn clear(&self) -> Option<Session> {
        let previous = self.current.write().take();
        self.avatars.clear();
        previous
    }

    pub fn avatars(&self) -> &AvatarCache {
        &self.avatars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roomchat_core::AvatarUrls;

    fn session(user: i64) -> Session {
        Session::bearer(
            Snowflake::new(user),
            "access".to_string(),
            "refresh".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_signed_out_user_id_is_an_error() {
        let store = SessionStore::new();
        assert!(matches!(store.user_id(), Err(ServiceError::NotAuthenticated)));
    }

    #[test]
    fn test_clear_drops_avatar_cache() {
        let store = SessionStore::new();
        store.set(session(1));
        store
            .avatars()
            .insert(Snowflake::new(2), AvatarUrls::resolve(None, "lee"));

        assert!(store.clear().is_some());
        assert!(store.avatars().is_empty());
        assert!(store.current().is_none());
    }

    #[test]
    fn test_switching_user_drops_avatar_cache() {
        let store = SessionStore::new();
        store.set(session(1));
        store
            .avatars()
            .insert(Snowflake::new(2), AvatarUrls::resolve(None, "lee"));

        store.set(session(1));
        assert_eq!(store.avatars().len(), 1);

        store.set(session(3));
        assert!(store.avatars().is_empty());
    }
}
