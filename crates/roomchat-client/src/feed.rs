//! Local list state reconciled with realtime changes
//!
//! A [`Feed`] holds items newest first and keys them by id. The optimistic
//! insert is the row the backend returned from the send, so it carries the
//! same backend-assigned id as its realtime echo; whichever arrives second
//! replaces the first instead of adding a duplicate.

use roomchat_core::{ChangeEvent, ChangeType, DirectMessage, Message, MessageWithAuthor, Snowflake};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::services::ServiceResult;

/// Something a feed can hold
pub trait FeedItem: Clone {
    /// Row shape carried by change events
    type Row: DeserializeOwned;

    fn id(&self) -> Snowflake;

    /// Build the item for a changed row, given what the feed held before
    fn from_row(row: Self::Row, previous: Option<&Self>) -> Self;
}

impl FeedItem for Message {
    type Row = Message;

    fn id(&self) -> Snowflake {
        self.id
    }

    fn from_row(row: Message, _previous: Option<&Self>) -> Self {
        row
    }
}

impl FeedItem for DirectMessage {
    type Row = DirectMessage;

    fn id(&self) -> Snowflake {
        self.id
    }

    fn from_row(row: DirectMessage, _previous: Option<&Self>) -> Self {
        row
    }
}

impl FeedItem for MessageWithAuthor {
    type Row = Message;

    fn id(&self) -> Snowflake {
        self.message.id
    }

    /// Change rows carry no author; keep the one already joined
    fn from_row(row: Message, previous: Option<&Self>) -> Self {
        Self {
            author: previous.and_then(|p| p.author.clone()),
            message: row,
        }
    }
}

/// What applying a change did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChange {
    Inserted(Snowflake),
    Updated(Snowflake),
    Removed(Snowflake),
    /// Nothing to do (e.g. delete of an id not in the feed)
    Ignored,
}

#[derive(Deserialize)]
struct RowId {
    id: Snowflake,
}

/// Newest-first list with at most one entry per id
#[derive(Debug, Clone)]
pub struct Feed<T> {
    items: Vec<T>,
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: FeedItem> Feed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a fetched page
    pub fn from_page(items: Vec<T>) -> Self {
        let mut feed = Self::new();
        feed.extend(items);
        feed
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Snowflake) -> Option<&T> {
        self.position(id).ok().map(|i| &self.items[i])
    }

    /// Cursor for loading the next older page
    pub fn oldest_id(&self) -> Option<Snowflake> {
        self.items.last().map(FeedItem::id)
    }

    /// Insert, or replace the entry with the same id
    pub fn upsert(&mut self, item: T) -> FeedChange {
        let id = item.id();
        match self.position(id) {
            Ok(i) => {
                self.items[i] = item;
                FeedChange::Updated(id)
            }
            Err(i) => {
                self.items.insert(i, item);
                FeedChange::Inserted(id)
            }
        }
    }

    /// Merge an older page (or any batch) into the feed
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.upsert(item);
        }
    }

    pub fn remove(&mut self, id: Snowflake) -> Option<T> {
        self.position(id).ok().map(|i| self.items.remove(i))
    }

    /// Apply a realtime change event
    ///
    /// Inserts and updates upsert by id; deletes remove the old row's id.
    pub fn apply(&mut self, event: &ChangeEvent) -> ServiceResult<FeedChange> {
        let change = match event.change_type {
            ChangeType::Insert | ChangeType::Update => {
                let Some(row) = event.decode_record::<T::Row>()? else {
                    return Ok(FeedChange::Ignored);
                };
                let RowId { id } = match event.decode_record::<RowId>()? {
                    Some(row_id) => row_id,
                    None => return Ok(FeedChange::Ignored),
                };
                let item = T::from_row(row, self.get(id));
                self.upsert(item)
            }
            ChangeType::Delete => match event.decode_old::<RowId>()? {
                Some(RowId { id }) => self
                    .remove(id)
                    .map_or(FeedChange::Ignored, |_| FeedChange::Removed(id)),
                None => FeedChange::Ignored,
            },
        };

        debug!(table = %event.table.as_str(), ?change, "Feed change applied");
        Ok(change)
    }

    /// Index of `id`, or where it would go (items are sorted by id descending)
    fn position(&self, id: Snowflake) -> Result<usize, usize> {
        self.items.binary_search_by(|probe| id.cmp(&probe.id()))
    }
}
