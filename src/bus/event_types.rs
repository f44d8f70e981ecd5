//! Hub events observed by UI layers.

use serde::{Deserialize, Serialize};

use crate::notification::BusinessNotification;

pub const EVENT_DELIVERED: &str = "notification.delivered";
pub const EVENT_READ: &str = "notification.read";
pub const EVENT_CLEARED: &str = "notification.cleared";
pub const EVENT_TOGGLED: &str = "notification.toggled";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum HubEvent {
    /// A notification entered the list.
    Delivered { notification: BusinessNotification },
    /// A notification was acknowledged.
    Read { id: String },
    /// The list was emptied.
    Cleared { removed: usize },
    /// Dispatching was switched on or off.
    Toggled { enabled: bool },
}

impl HubEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => EVENT_DELIVERED,
            Self::Read { .. } => EVENT_READ,
            Self::Cleared { .. } => EVENT_CLEARED,
            Self::Toggled { .. } => EVENT_TOGGLED,
        }
    }
}
