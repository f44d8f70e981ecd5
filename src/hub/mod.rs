//! Business-notification hub.
//!
//! The hub ties the pieces together for calling UI code:
//! - `NotificationCenter`: bounded list plus sound / toast / native delivery
//! - `dispatch::start`: opens the message and invoice sources for an identity
//!   and returns a `DispatchHandle`
//! - `NotificationHub`: enable toggle, identity changes, read marking and
//!   permission negotiation
//!
//! Whenever the identity or the enabled flag changes, the running sources
//! are stopped (their channels closed) before new ones are opened.
//!
//! ```ignore
//! let hub = NotificationHub::new(settings, feed, directory, sinks);
//! hub.set_identity(Some(user_id), Some(mcard_id)).await;
//! let unread = hub.unread_count();
//! ```

mod center;
mod dispatch;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::bus::{BusEvent, EventBus, HubEvent};
use crate::config::NotifierSettings;
use crate::delivery::PermissionState;
use crate::directory::Directory;
use crate::feed::ChangeFeed;
use crate::notification::BusinessNotification;

pub use center::{DeliverySinks, NotificationCenter};
pub use dispatch::{start, DispatchConfig, DispatchHandle};

struct HubState {
    config: DispatchConfig,
    handle: Option<DispatchHandle>,
}

pub struct NotificationHub {
    center: Arc<NotificationCenter>,
    bus: Arc<EventBus>,
    feed: Arc<dyn ChangeFeed>,
    directory: Arc<dyn Directory>,
    fallback_sender: String,
    enabled: AtomicBool,
    state: Mutex<HubState>,
}

impl NotificationHub {
    pub fn new(
        settings: NotifierSettings,
        feed: Arc<dyn ChangeFeed>,
        directory: Arc<dyn Directory>,
        sinks: DeliverySinks,
    ) -> Self {
        let bus = Arc::new(EventBus::new());
        let center = Arc::new(NotificationCenter::new(&settings, sinks, bus.clone()));
        Self {
            center,
            bus,
            feed,
            directory,
            fallback_sender: settings.fallback_sender,
            enabled: AtomicBool::new(true),
            state: Mutex::new(HubState {
                config: DispatchConfig::default(),
                handle: None,
            }),
        }
    }

    /// Switch to a new identity. Sources for the previous identity are
    /// closed first.
    pub async fn set_identity(&self, user_id: Option<String>, mcard_id: Option<String>) {
        let mut state = self.state.lock().await;
        let config = DispatchConfig::new(user_id, mcard_id);
        if state.config == config && state.handle.is_some() {
            return;
        }
        state.config = config;
        self.reconcile(&mut state).await;
    }

    /// Flip the enabled flag and return the new value.
    pub async fn toggle_notifications(&self) -> bool {
        let mut state = self.state.lock().await;
        let enabled = !self.enabled.load(Ordering::SeqCst);
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "notifications toggled");
        self.reconcile(&mut state).await;
        self.bus.emit(HubEvent::Toggled { enabled });
        enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    async fn reconcile(&self, state: &mut HubState) {
        if let Some(mut handle) = state.handle.take() {
            handle.stop().await;
        }
        if !self.is_enabled() {
            return;
        }

        let handle = start(
            &state.config,
            self.feed.clone(),
            self.directory.clone(),
            self.center.clone(),
            &self.fallback_sender,
        )
        .await;
        state.handle = Some(handle);
    }

    /// Channels currently open for this hub.
    pub async fn active_channels(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .handle
            .as_ref()
            .map(DispatchHandle::channels)
            .unwrap_or_default()
    }

    /// Prompt for native notification permission if still undecided.
    /// Returns whether permission is granted afterwards.
    pub async fn request_notification_permission(&self) -> bool {
        let permission = self.center.permission();
        let current = permission.state();
        if current != PermissionState::Default {
            return current.is_granted();
        }
        match permission.request().await {
            Ok(state) => {
                tracing::info!(?state, "notification permission decided");
                state.is_granted()
            }
            Err(error) => {
                tracing::warn!(error = %error, "notification permission request failed");
                false
            }
        }
    }

    /// Deliver a notification produced outside the built-in sources.
    pub fn push(&self, notification: BusinessNotification) -> bool {
        self.center.deliver(notification)
    }

    pub fn notifications(&self) -> Vec<BusinessNotification> {
        self.center.notifications()
    }

    pub fn unread_count(&self) -> usize {
        self.center.unread_count()
    }

    pub fn mark_as_read(&self, id: &str) -> bool {
        self.center.mark_as_read(id)
    }

    pub fn clear_all(&self) -> usize {
        self.center.clear_all()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.bus.subscribe()
    }

    /// Close every open channel. The hub can be reconfigured afterwards.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let Some(mut handle) = state.handle.take() {
            handle.stop().await;
        }
    }
}
