//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use roomchat_client::dto::SignUpRequest;
use roomchat_core::{Chatroom, Profile, Province, Region, Role, Snowflake, SnowflakeGenerator};
use roomchat_db::MemoryBackend;
use std::sync::LazyLock;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Ids for rows seeded directly into a backend
static IDS: LazyLock<SnowflakeGenerator> = LazyLock::new(|| SnowflakeGenerator::new(1000));

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

pub fn next_id() -> Snowflake {
    IDS.generate()
}

/// Sign-up request with a unique email and username
pub fn unique_sign_up() -> SignUpRequest {
    let suffix = unique_suffix();
    SignUpRequest {
        email: format!("user{suffix}@example.com"),
        password: "correct-horse-battery".to_string(),
        username: format!("user_{suffix}"),
    }
}

/// Profile seeded without credentials
pub fn seed_user(backend: &MemoryBackend, role: Role) -> Profile {
    let mut profile = Profile::new(next_id(), format!("member_{}", unique_suffix()));
    profile.role = role;
    backend.seed_profile(profile.clone());
    profile
}

/// One region, one province, one active chatroom
#[derive(Debug, Clone)]
pub struct SeededCatalog {
    pub region: Region,
    pub province: Province,
    pub chatroom: Chatroom,
}

pub fn seed_catalog(backend: &MemoryBackend, max_members: i32) -> SeededCatalog {
    let region = Region {
        id: next_id(),
        name: "Seoul".to_string(),
        order_sequence: 1,
    };
    let province = Province {
        id: next_id(),
        region_id: region.id,
        name: "Gangnam-gu".to_string(),
        order_sequence: 1,
    };
    let chatroom = Chatroom::new(next_id(), province.id, "Gangnam Lounge".to_string(), max_members);

    backend.seed_region(region.clone());
    backend.seed_province(province.clone());
    backend.seed_chatroom(chatroom.clone());

    SeededCatalog {
        region,
        province,
        chatroom,
    }
}

/// Extra chatroom in an existing province
pub fn seed_chatroom(backend: &MemoryBackend, province_id: Snowflake, name: &str) -> Chatroom {
    let chatroom = Chatroom::new(next_id(), province_id, name.to_string(), 100);
    backend.seed_chatroom(chatroom.clone());
    chatroom
}

/// Small PNG-sized payload
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len.max(8)];
    bytes[..8].copy_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    bytes
}
