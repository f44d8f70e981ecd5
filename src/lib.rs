//! FinderID business-notification dispatcher.
//!
//! Listens to the realtime change feed for a signed-in mCard owner and turns
//! noteworthy row changes (new messages, appointment requests, sales,
//! payments) into in-memory notifications, delivered with a short tone, an
//! on-screen toast and, when permitted, a native notification.
//!
//! # Architecture
//!
//! Changes flow from feed → source → center → sinks:
//! - `feed`: change-feed abstraction and an in-process broadcast feed
//! - `sources`: message and invoice adapters built from ordered classifiers
//! - `hub`: fan-in center, subscription lifecycle, enable toggle, permission
//! - `delivery`: tone synthesis, toast and native notification surfaces
//! - `directory`: sender-name and card lookups (in-memory or REST)
//! - `bus`: hub events for UI observers
//! - `config`: settings from defaults, JSON file or environment

pub mod bus;
pub mod config;
pub mod delivery;
pub mod directory;
pub mod feed;
pub mod hub;
pub mod notification;
pub mod sources;

#[cfg(test)]
mod testing;

pub use config::NotifierSettings;
pub use hub::{DeliverySinks, DispatchConfig, DispatchHandle, NotificationHub};
pub use notification::{BusinessNotification, NotificationType};

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Feed(#[from] feed::FeedError),
    #[error("{0}")]
    Directory(#[from] directory::DirectoryError),
    #[error("{0}")]
    Delivery(#[from] delivery::DeliveryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Usage(String),
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

pub const DEFAULT_LOG_FILTER: &str = "finderid_notifier=debug,info";

/// Install the global tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
