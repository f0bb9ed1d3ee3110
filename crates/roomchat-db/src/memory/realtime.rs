//! Realtime ports for the in-memory backend

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use roomchat_core::events::{ChangeEvent, Subscription};
use roomchat_core::traits::{ChangePublisher, ChangeStream, RealtimeFeed, RepoResult};

use super::MemoryBackend;

#[async_trait]
impl RealtimeFeed for MemoryBackend {
    async fn subscribe(&self, subscription: Subscription) -> RepoResult<ChangeStream> {
        let rx = self.events.subscribe();

        let stream = futures::stream::unfold(rx, move |mut rx| {
            let subscription = subscription.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(event) if subscription.matches(&event) => return Some((event, rx)),
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, table = %subscription.table, "realtime subscriber lagged");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}

/// Lets external producers inject events, e.g. to replay a change
#[async_trait]
impl ChangePublisher for MemoryBackend {
    async fn publish(&self, event: &ChangeEvent) -> RepoResult<()> {
        self.emit(Some(event.clone()));
        Ok(())
    }
}
