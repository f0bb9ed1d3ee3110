//! Postgres NOTIFY -> change event pump
//!
//! Row triggers write every change to one NOTIFY channel (see the init
//! migration). [`ChangeListener`] decodes those payloads and hands them to a
//! [`ChangePublisher`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use roomchat_core::error::DomainError;
use roomchat_core::events::{ChangeEvent, ChangeType, Table};
use roomchat_core::traits::{ChangePublisher, RepoResult};

use crate::repositories::map_db_error;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Wire shape of a NOTIFY payload
#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(flatten)]
    event: ChangeEvent,
    /// Set when the row was too large for NOTIFY; only key and filter columns were sent
    #[serde(default)]
    truncated: bool,
}

/// Decode a NOTIFY payload, reporting whether the row must be reloaded
pub(crate) fn parse_payload(payload: &str) -> RepoResult<(ChangeEvent, bool)> {
    let notification: Notification = serde_json::from_str(payload)
        .map_err(|e| DomainError::RealtimeError(format!("bad change payload: {e}")))?;
    Ok((notification.event, notification.truncated))
}

/// Forwards database change notifications to a publisher
pub struct ChangeListener {
    pool: PgPool,
    channel: String,
    publisher: Arc<dyn ChangePublisher>,
}

impl ChangeListener {
    pub fn new(pool: PgPool, channel: impl Into<String>, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self {
            pool,
            channel: channel.into(),
            publisher,
        }
    }

    /// Listen until `shutdown` is cancelled, reconnecting after errors
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            match self.listen(&shutdown).await {
                Ok(()) => {
                    info!(channel = %self.channel, "change listener stopped (shutdown)");
                    return;
                }
                Err(e) => {
                    error!(error = %e, channel = %self.channel, "change listener failed, reconnecting");
                    tokio::select! {
                        () = shutdown.cancelled() => return,
                        () = sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }
    }

    async fn listen(&self, shutdown: &CancellationToken) -> RepoResult<()> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(map_db_error)?;
        listener.listen(&self.channel).await.map_err(map_db_error)?;
        info!(channel = %self.channel, "listening for row changes");

        loop {
            let notification = tokio::select! {
                () = shutdown.cancelled() => return Ok(()),
                received = listener.recv() => received.map_err(map_db_error)?,
            };

            match parse_payload(notification.payload()) {
                Ok((event, truncated)) => self.forward(event, truncated).await,
                Err(e) => warn!(error = %e, "dropping undecodable change payload"),
            }
        }
    }

    async fn forward(&self, mut event: ChangeEvent, truncated: bool) {
        if truncated {
            if let Err(e) = self.reload(&mut event).await {
                warn!(error = %e, table = %event.table, "could not reload truncated row");
            }
        }

        debug!(table = %event.table, change = ?event.change_type, "forwarding change");
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(error = %e, table = %event.table, "failed to publish change");
        }
    }

    /// Replace a cut-down record with the current row
    async fn reload(&self, event: &mut ChangeEvent) -> RepoResult<()> {
        // A deleted row is gone; its cut-down old row still carries the filter
        // columns. Membership rows have no id column.
        if event.change_type == ChangeType::Delete || event.table == Table::ChatroomMembers {
            return Ok(());
        }
        let Some(id) = event
            .record
            .as_ref()
            .and_then(|r| r.get("id"))
            .and_then(serde_json::Value::as_i64)
        else {
            return Ok(());
        };

        let row = sqlx::query_scalar::<_, serde_json::Value>(&format!(
            "SELECT to_jsonb(t) - 'push_token' FROM {} t WHERE id = $1",
            event.table.as_str()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        if let Some(row) = row {
            event.record = Some(row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomchat_core::events::{ChangeFilter, Subscription};

    #[test]
    fn test_parse_trigger_payload() {
        let payload = r#"{
            "table": "messages",
            "type": "INSERT",
            "record": {"id": 42, "chatroom_id": 7, "content": "hi"},
            "old_record": null,
            "commit_timestamp": "2024-05-01T10:00:00.123456Z"
        }"#;
        let (event, truncated) = parse_payload(payload).unwrap();
        assert_eq!(event.table, Table::Messages);
        assert_eq!(event.change_type, ChangeType::Insert);
        assert!(event.old_record.is_none());
        assert!(!truncated);
    }

    #[test]
    fn test_parse_truncated_payload() {
        let payload = r#"{
            "table": "profiles",
            "type": "UPDATE",
            "record": {"id": 1},
            "old_record": {"id": 1},
            "commit_timestamp": "2024-05-01T10:00:00Z",
            "truncated": true
        }"#;
        let (event, truncated) = parse_payload(payload).unwrap();
        assert_eq!(event.table, Table::Profiles);
        assert!(truncated);
    }

    #[test]
    fn test_truncated_delete_still_matches_filters() {
        let payload = r#"{
            "table": "direct_messages",
            "type": "DELETE",
            "record": null,
            "old_record": {"id": 9, "conversation_id": "1_2", "sender_id": 1, "receiver_id": 2},
            "commit_timestamp": "2024-05-01T10:00:00Z",
            "truncated": true
        }"#;
        let (event, truncated) = parse_payload(payload).unwrap();
        assert!(truncated);

        let subscription = Subscription::table(Table::DirectMessages)
            .filter(ChangeFilter::equals("conversation_id", "1_2"));
        assert!(subscription.matches(&event));
        let other = Subscription::table(Table::DirectMessages)
            .filter(ChangeFilter::equals("receiver_id", 3));
        assert!(!other.matches(&event));
    }

    #[test]
    fn test_parse_rejects_unknown_table() {
        let payload = r#"{"table": "secrets", "type": "INSERT", "record": {}, "old_record": null,
                          "commit_timestamp": "2024-05-01T10:00:00Z"}"#;
        assert!(parse_payload(payload).is_err());
    }
}
