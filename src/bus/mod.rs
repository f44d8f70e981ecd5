//! Hub event bus.
//!
//! UI layers subscribe to observe list and toggle changes instead of
//! polling the hub:
//! - `EventBus`: in-memory broadcast channel, sequence-stamped
//! - `HubEvent`: delivered / read / cleared / toggled

mod event_bus;
mod event_types;

pub use event_bus::{BusEvent, EventBus};
pub use event_types::HubEvent;
