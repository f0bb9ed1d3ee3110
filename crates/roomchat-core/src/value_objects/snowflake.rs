//! Snowflake ID - time-ordered 64-bit identifier
//!
//! Rows (messages, direct messages, accounts) get their Snowflake from the
//! backend when they are inserted: Postgres mints it in `roomchat_next_id()`,
//! the in-memory backend with one [`SnowflakeGenerator`] shared by every
//! client. Because the high bits are a millisecond timestamp, ordering by id
//! is ordering by creation time, which is what the cursor pagination relies on.
//!
//! Layout:
//! - Bits 63-22: milliseconds since [`Snowflake::EPOCH`]
//! - Bits 21-12: worker id, 0-1023 (Postgres uses bits 21-0 as one sequence)
//! - Bits 11-0:  per-millisecond sequence, 0-4095

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const WORKER_BITS: i64 = 10;
const SEQUENCE_BITS: i64 = 12;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const MAX_WORKER_ID: u16 = 1 << WORKER_BITS;

/// Time-ordered 64-bit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// 2024-01-01 00:00:00 UTC in Unix milliseconds
    pub const EPOCH: i64 = 1_704_067_200_000;

    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Unix milliseconds encoded in the id
    #[inline]
    pub fn timestamp(&self) -> i64 {
        (self.0 >> (WORKER_BITS + SEQUENCE_BITS)) + Self::EPOCH
    }

    #[inline]
    pub fn worker_id(&self) -> u16 {
        ((self.0 >> SEQUENCE_BITS) & i64::from(MAX_WORKER_ID - 1)) as u16
    }

    #[inline]
    pub fn sequence(&self) -> u16 {
        (self.0 & SEQUENCE_MASK) as u16
    }

    /// Creation time encoded in the id
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.timestamp()).unwrap_or_default()
    }

    /// Smallest id that could have been generated at `millis` (Unix ms).
    ///
    /// Useful as an exclusive cursor for "everything before this instant".
    pub fn lower_bound_at(millis: i64) -> Self {
        Self((millis - Self::EPOCH).max(0) << (WORKER_BITS + SEQUENCE_BITS))
    }

    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        s.trim()
            .parse::<i64>()
            .map(Snowflake)
            .map_err(|_| SnowflakeParseError::InvalidFormat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid snowflake format")]
    InvalidFormat,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Snowflake::parse(s)
    }
}

// Strings in JSON: 64-bit integers do not survive JavaScript clients.
impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Accepts both forms: change-feed rows from Postgres carry bigint columns as numbers.
impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer snowflake id")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Snowflake, E> {
                Ok(Snowflake(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Snowflake, E> {
                i64::try_from(value)
                    .map(Snowflake)
                    .map_err(|_| E::custom("snowflake out of range"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Snowflake, E> {
                Snowflake::parse(value).map_err(|_| E::custom("invalid snowflake string"))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

/// Lock-free Snowflake generator
///
/// The last issued `(timestamp, sequence)` pair is packed into one atomic so
/// that a single compare-exchange both claims a sequence number and advances
/// the clock.
#[derive(Debug)]
pub struct SnowflakeGenerator {
    worker_id: u16,
    // (millis since EPOCH) << SEQUENCE_BITS | sequence
    state: AtomicI64,
}

impl SnowflakeGenerator {
    /// # Panics
    /// Panics if `worker_id >= 1024`
    pub fn new(worker_id: u16) -> Self {
        assert!(worker_id < MAX_WORKER_ID, "Worker ID must be < 1024");
        Self {
            worker_id,
            state: AtomicI64::new(0),
        }
    }

    pub fn generate(&self) -> Snowflake {
        loop {
            let now = Self::now_millis() - Snowflake::EPOCH;
            let current = self.state.load(Ordering::Acquire);
            let last_millis = current >> SEQUENCE_BITS;
            let last_sequence = current & SEQUENCE_MASK;

            let next = if now > last_millis {
                now << SEQUENCE_BITS
            } else if last_sequence < SEQUENCE_MASK {
                // Same millisecond (or the clock stepped back): keep the last
                // timestamp so ids stay monotonic.
                current + 1
            } else {
                // Sequence exhausted for this millisecond; borrow the next one.
                (last_millis + 1) << SEQUENCE_BITS
            };

            if self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let millis = next >> SEQUENCE_BITS;
                let sequence = next & SEQUENCE_MASK;
                return Snowflake::new(
                    (millis << (WORKER_BITS + SEQUENCE_BITS))
                        | (i64::from(self.worker_id) << SEQUENCE_BITS)
                        | sequence,
                );
            }
        }
    }

    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(Snowflake::EPOCH)
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
