//! Change kind flags for realtime subscriptions
//!
//! A subscription selects which row-level operations it wants delivered.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Row-level change operations
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChangeKinds: u8 {
        const INSERT = 1 << 0;
        const UPDATE = 1 << 1;
        const DELETE = 1 << 2;

        /// Equivalent of subscribing to `*`
        const ALL = Self::INSERT.bits() | Self::UPDATE.bits() | Self::DELETE.bits();
    }
}

impl Default for ChangeKinds {
    fn default() -> Self {
        Self::ALL
    }
}

impl Serialize for ChangeKinds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for ChangeKinds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}
