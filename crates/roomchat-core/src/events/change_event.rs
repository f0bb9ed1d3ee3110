//! Row change events delivered by the realtime feed
//!
//! Every insert, update, or delete on a watched table produces one
//! [`ChangeEvent`] carrying the new row and, for updates and deletes, the old
//! one. Subscribers pick events with a [`Subscription`].

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::ChangeKinds;

/// Tables that publish change events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    Messages,
    DirectMessages,
    Chatrooms,
    ChatroomMembers,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Self::Profiles,
        Self::Messages,
        Self::DirectMessages,
        Self::Chatrooms,
        Self::ChatroomMembers,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Messages => "messages",
            Self::DirectMessages => "direct_messages",
            Self::Chatrooms => "chatrooms",
            Self::ChatroomMembers => "chatroom_members",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::RealtimeError(format!("unknown table: {s}")))
    }
}

/// Row-level operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

impl ChangeType {
    pub fn kind(&self) -> ChangeKinds {
        match self {
            Self::Insert => ChangeKinds::INSERT,
            Self::Update => ChangeKinds::UPDATE,
            Self::Delete => ChangeKinds::DELETE,
        }
    }
}

/// One row change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// New row; absent for deletes
    pub record: Option<serde_json::Value>,
    /// Previous row; present for updates and deletes
    pub old_record: Option<serde_json::Value>,
    pub commit_timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn insert<T: Serialize>(table: Table, row: &T) -> Result<Self, DomainError> {
        Ok(Self {
            table,
            change_type: ChangeType::Insert,
            record: Some(to_value(row)?),
            old_record: None,
            commit_timestamp: Utc::now(),
        })
    }

    pub fn update<T: Serialize>(table: Table, old: &T, new: &T) -> Result<Self, DomainError> {
        Ok(Self {
            table,
            change_type: ChangeType::Update,
            record: Some(to_value(new)?),
            old_record: Some(to_value(old)?),
            commit_timestamp: Utc::now(),
        })
    }

    pub fn delete<T: Serialize>(table: Table, old: &T) -> Result<Self, DomainError> {
        Ok(Self {
            table,
            change_type: ChangeType::Delete,
            record: None,
            old_record: Some(to_value(old)?),
            commit_timestamp: Utc::now(),
        })
    }

    /// The row the event is about: new row, or old row for deletes
    pub fn row(&self) -> Option<&serde_json::Value> {
        self.record.as_ref().or(self.old_record.as_ref())
    }

    /// Decode the new row
    pub fn decode_record<T: DeserializeOwned>(&self) -> Result<Option<T>, DomainError> {
        decode(self.record.as_ref())
    }

    /// Decode the previous row
    pub fn decode_old<T: DeserializeOwned>(&self) -> Result<Option<T>, DomainError> {
        decode(self.old_record.as_ref())
    }
}

fn to_value<T: Serialize>(row: &T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(row).map_err(|e| DomainError::RealtimeError(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Option<&serde_json::Value>) -> Result<Option<T>, DomainError> {
    value
        .map(|v| T::deserialize(v).map_err(|e| DomainError::RealtimeError(e.to_string())))
        .transpose()
}

/// Equality filter on one column: `column=eq.value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub column: String,
    pub value: String,
}

impl ChangeFilter {
    pub fn equals(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// Parse `column=eq.value`
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let (column, rest) = s
            .split_once('=')
            .ok_or_else(|| DomainError::ValidationError(format!("invalid filter: {s}")))?;
        let value = rest
            .strip_prefix("eq.")
            .ok_or_else(|| DomainError::ValidationError(format!("unsupported filter operator: {s}")))?;
        if column.is_empty() {
            return Err(DomainError::ValidationError(format!("invalid filter: {s}")));
        }
        Ok(Self::equals(column, value))
    }

    /// Compare against a row, treating numbers and strings alike
    pub fn matches(&self, row: &serde_json::Value) -> bool {
        match row.get(&self.column) {
            Some(serde_json::Value::String(s)) => *s == self.value,
            Some(serde_json::Value::Number(n)) => n.to_string() == self.value,
            Some(serde_json::Value::Bool(b)) => b.to_string() == self.value,
            _ => false,
        }
    }
}

impl fmt::Display for ChangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}

/// What a realtime listener wants delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub table: Table,
    #[serde(default)]
    pub kinds: ChangeKinds,
    pub filter: Option<ChangeFilter>,
}

impl Subscription {
    /// All changes on `table`
    pub fn table(table: Table) -> Self {
        Self {
            table,
            kinds: ChangeKinds::ALL,
            filter: None,
        }
    }

    pub fn kinds(mut self, kinds: ChangeKinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn filter(mut self, filter: ChangeFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Deletes are matched against the old row
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table || !self.kinds.contains(event.change_type.kind()) {
            return false;
        }
        match &self.filter {
            None => true,
            Some(filter) => event.row().is_some_and(|row| filter.matches(row)),
        }
    }
}
