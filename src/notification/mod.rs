//! Business notification model.
//!
//! Notifications are transient: they live in a bounded, newest-first list
//! owned by the hub and are never persisted.

mod list;
mod types;

pub use list::{NotificationList, PushOutcome, DEFAULT_CAPACITY};
pub use types::{format_amount, BusinessNotification, NotificationType};
