use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::HubEvent;

const BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub seq: i64,
    #[serde(flatten)]
    pub event: HubEvent,
    pub created_at: String,
}

pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
    seq: AtomicI64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            tx,
            seq: AtomicI64::new(0),
        }
    }

    /// Stamp and publish an event. Having no observers is not an error.
    pub fn emit(&self, event: HubEvent) -> BusEvent {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let stamped = BusEvent {
            seq,
            event,
            created_at: Utc::now().to_rfc3339(),
        };
        if self.tx.send(stamped.clone()).is_err() {
            tracing::trace!(event = stamped.event.name(), "no hub observers");
        }
        stamped
    }

    /// Get a new receiver for this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }
}
