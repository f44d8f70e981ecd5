//! Realtime change-feed abstraction.
//!
//! A feed pushes row-level INSERT/UPDATE/DELETE events to subscribers. Each
//! subscription is a named channel with one or more [`ChangeFilter`]s; events
//! matching any filter are delivered in the order the feed observed them.
//! Reconnection is the feed implementation's concern.

mod in_memory;
mod types;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use uuid::Uuid;

pub use in_memory::InMemoryChangeFeed;
pub use types::{ChangeEvent, ChangeFilter, ChangeKind};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("subscription rejected: {0}")]
    Subscribe(String),
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("feed closed")]
    Closed,
}

/// Live subscription to a feed channel.
pub struct FeedSubscription {
    id: Uuid,
    channel: String,
    events: BoxStream<'static, ChangeEvent>,
}

impl FeedSubscription {
    pub fn new(channel: impl Into<String>, events: BoxStream<'static, ChangeEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next matching event, or `None` once the feed has closed this channel.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.events.next().await
    }
}

impl std::fmt::Debug for FeedSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .finish()
    }
}

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open `channel` with the given filters.
    async fn subscribe(
        &self,
        channel: &str,
        filters: Vec<ChangeFilter>,
    ) -> Result<FeedSubscription, FeedError>;

    /// Close a channel. No event is delivered to it afterwards.
    async fn remove_channel(&self, subscription: FeedSubscription) -> Result<(), FeedError>;
}
