//! In-memory backend
//!
//! Implements every port from roomchat-core against plain collections behind
//! one `parking_lot` mutex. Writes publish change events on a broadcast
//! channel, so realtime subscriptions behave like the Postgres + relay path.
//! Used by tests and for running the client without infrastructure.

mod auth;
mod realtime;
mod repositories;
mod storage;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use roomchat_common::JwtService;
use roomchat_core::entities::{
    Chatroom, ChatroomMembership, DirectMessage, Message, Profile, Province, RateLimitAction,
    RateLimitCounter, Region,
};
use roomchat_core::events::{ChangeEvent, Table};
use roomchat_core::value_objects::{Snowflake, SnowflakeGenerator};

const DEFAULT_EVENT_BUFFER: usize = 1024;
const DEFAULT_PUBLIC_BASE_URL: &str = "memory://storage";

#[derive(Debug, Clone)]
struct Credential {
    email: String,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct RefreshRecord {
    user_id: Snowflake,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Default)]
struct State {
    credentials: HashMap<Snowflake, Credential>,
    /// Lowercased email -> user id
    emails: HashMap<String, Snowflake>,
    /// Refresh token hash -> record
    refresh_tokens: HashMap<String, RefreshRecord>,
    profiles: BTreeMap<Snowflake, Profile>,
    regions: BTreeMap<Snowflake, Region>,
    provinces: BTreeMap<Snowflake, Province>,
    chatrooms: BTreeMap<Snowflake, Chatroom>,
    members: BTreeMap<(Snowflake, Snowflake), ChatroomMembership>,
    messages: BTreeMap<Snowflake, Message>,
    direct_messages: BTreeMap<Snowflake, DirectMessage>,
    rate_limits: HashMap<(Snowflake, RateLimitAction), RateLimitCounter>,
    buckets: HashSet<String>,
    objects: HashMap<(String, String), StoredBlob>,
}

impl State {
    fn member_count(&self, chatroom_id: Snowflake) -> i64 {
        self.members
            .range((chatroom_id, Snowflake::new(i64::MIN))..=(chatroom_id, Snowflake::new(i64::MAX)))
            .count() as i64
    }
}

/// Thread-safe in-memory backend; clones share state
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    /// Mints ids for inserted rows; shared so every client sees one sequence
    ids: Arc<SnowflakeGenerator>,
    events: broadcast::Sender<ChangeEvent>,
    jwt: JwtService,
    public_base_url: String,
}

impl MemoryBackend {
    pub fn new(jwt: JwtService) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_BUFFER);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            ids: Arc::new(SnowflakeGenerator::default()),
            events,
            jwt,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run `f` with exclusive access to the state
    fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut State) -> R,
    {
        let mut state = self.state.lock();
        f(&mut state)
    }

    /// Publish change events; having no subscribers is not an error
    fn emit(&self, events: impl IntoIterator<Item = ChangeEvent>) {
        for event in events {
            trace!(table = %event.table, change = ?event.change_type, "memory change");
            let _ = self.events.send(event);
        }
    }

    /// Number of live realtime receivers
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    pub fn seed_region(&self, region: Region) {
        self.with_state(|s| s.regions.insert(region.id, region));
    }

    pub fn seed_province(&self, province: Province) {
        self.with_state(|s| s.provinces.insert(province.id, province));
    }

    pub fn seed_chatroom(&self, chatroom: Chatroom) {
        self.with_state(|s| s.chatrooms.insert(chatroom.id, chatroom));
    }

    /// Insert a profile without credentials
    pub fn seed_profile(&self, profile: Profile) {
        self.with_state(|s| s.profiles.insert(profile.id, profile));
    }

    /// Set a profile's push token, as the device registration flow would
    pub fn set_push_token(&self, user_id: Snowflake, token: Option<String>) -> bool {
        self.with_state(|s| match s.profiles.get_mut(&user_id) {
            Some(profile) => {
                profile.push_token = token;
                true
            }
            None => false,
        })
    }

    pub fn set_chatroom_active(&self, chatroom_id: Snowflake, is_active: bool) {
        let event = self.with_state(|s| {
            let room = s.chatrooms.get_mut(&chatroom_id)?;
            let old = room.clone();
            room.is_active = is_active;
            ChangeEvent::update(Table::Chatrooms, &old, &*room).ok()
        });
        self.emit(event);
    }

    /// Raw bytes of a stored object
    pub fn object_bytes(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.with_state(|s| {
            s.objects
                .get(&(bucket.to_string(), path.to_string()))
                .map(|blob| blob.bytes.clone())
        })
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("public_base_url", &self.public_base_url)
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

/// Profiles go out without their push token
fn public_profile(profile: &Profile) -> Profile {
    Profile {
        push_token: None,
        ..profile.clone()
    }
}

fn insert_event<T: Serialize>(table: Table, row: &T) -> Option<ChangeEvent> {
    ChangeEvent::insert(table, row).ok()
}

fn update_event<T: Serialize>(table: Table, old: &T, new: &T) -> Option<ChangeEvent> {
    ChangeEvent::update(table, old, new).ok()
}

fn delete_event<T: Serialize>(table: Table, old: &T) -> Option<ChangeEvent> {
    ChangeEvent::delete(table, old).ok()
}

#[cfg(test)]
pub(crate) fn test_backend() -> MemoryBackend {
    MemoryBackend::new(JwtService::new("memory-test-secret", 3600, 86_400))
}
