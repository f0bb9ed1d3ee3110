//! Pub/Sub channel definitions.
//!
//! Each watched table gets one Redis channel, `realtime:{table}`. Filters are
//! applied by subscribers, not by channel name.

use roomchat_core::events::Table;

/// Channel prefix for table change events
pub const REALTIME_CHANNEL_PREFIX: &str = "realtime:";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Change events of one table
    Table(Table),
    /// Any other channel name
    Custom(String),
}

impl PubSubChannel {
    #[must_use]
    pub fn table(table: Table) -> Self {
        Self::Table(table)
    }

    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Table(table) => format!("{REALTIME_CHANNEL_PREFIX}{table}"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        name.strip_prefix(REALTIME_CHANNEL_PREFIX)
            .and_then(|table| table.parse::<Table>().ok())
            .map_or_else(|| Self::Custom(name.to_string()), Self::Table)
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
