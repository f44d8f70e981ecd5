use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream;
use futures::StreamExt;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{ChangeEvent, ChangeFeed, ChangeFilter, FeedError, FeedSubscription};

const FEED_CAPACITY: usize = 1024;

/// Process-local change feed backed by a broadcast channel.
///
/// Every subscription gets its own receiver and filters locally, so one
/// published event reaches each matching channel exactly once.
pub struct InMemoryChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
    channels: DashMap<Uuid, String>,
    published: AtomicU64,
}

impl Default for InMemoryChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            tx,
            channels: DashMap::new(),
            published: AtomicU64::new(0),
        }
    }

    /// Publish a change. Returns how many open channels could observe it.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("change published with no open channels");
                0
            }
        }
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Names of the currently open channels.
    pub fn active_channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ChangeFeed for InMemoryChangeFeed {
    async fn subscribe(
        &self,
        channel: &str,
        filters: Vec<ChangeFilter>,
    ) -> Result<FeedSubscription, FeedError> {
        if filters.is_empty() {
            return Err(FeedError::Subscribe(format!(
                "channel {channel} needs at least one filter"
            )));
        }

        let rx = self.tx.subscribe();
        let channel_name = channel.to_string();
        let events = stream::unfold(
            (rx, filters, channel_name),
            |(mut rx, filters, name)| async move {
                loop {
                    match rx.recv().await {
                        Ok(event) => {
                            if filters.iter().any(|filter| filter.matches(&event)) {
                                return Some((event, (rx, filters, name)));
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(
                                channel = %name,
                                "change feed lagged, dropped {n} events"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            },
        )
        .boxed();

        let subscription = FeedSubscription::new(channel, events);
        self.channels.insert(subscription.id(), channel.to_string());
        tracing::debug!(channel, id = %subscription.id(), "channel subscribed");
        Ok(subscription)
    }

    async fn remove_channel(&self, subscription: FeedSubscription) -> Result<(), FeedError> {
        let id = subscription.id();
        let channel = subscription.channel().to_string();
        drop(subscription);
        if self.channels.remove(&id).is_none() {
            return Err(FeedError::UnknownChannel(channel));
        }
        tracing::debug!(channel = %channel, id = %id, "channel removed");
        Ok(())
    }
}
