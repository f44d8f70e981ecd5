use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::bus::{EventBus, HubEvent};
use crate::config::NotifierSettings;
use crate::delivery::{OsNotification, PermissionBroker, Toast, ToastSink, ToneEmitter};
use crate::notification::{BusinessNotification, NotificationList, PushOutcome};

/// Delivery surfaces injected into the center.
#[derive(Clone)]
pub struct DeliverySinks {
    pub tones: Arc<dyn ToneEmitter>,
    pub toasts: Arc<dyn ToastSink>,
    pub permission: Arc<dyn PermissionBroker>,
}

/// Fan-in point shared by every source.
///
/// Owns the notification list and performs the four independent side
/// effects of a delivery: list insertion, tone, toast and native
/// notification.
pub struct NotificationCenter {
    list: Mutex<NotificationList>,
    sinks: DeliverySinks,
    bus: Arc<EventBus>,
    toast_duration: Duration,
    icon: String,
    sound_enabled: bool,
}

impl NotificationCenter {
    pub fn new(settings: &NotifierSettings, sinks: DeliverySinks, bus: Arc<EventBus>) -> Self {
        Self {
            list: Mutex::new(NotificationList::with_capacity(settings.capacity)),
            sinks,
            bus,
            toast_duration: settings.toast_duration(),
            icon: settings.icon.clone(),
            sound_enabled: settings.sound_enabled,
        }
    }

    /// Deliver one notification. Returns false when it was a duplicate of
    /// an id already held, in which case nothing else happens.
    pub fn deliver(&self, notification: BusinessNotification) -> bool {
        let outcome = {
            let mut list = self.list.lock().expect("notification list mutex poisoned");
            list.push(notification.clone())
        };
        match outcome {
            PushOutcome::Duplicate => {
                tracing::debug!(
                    notification_id = %notification.id,
                    "duplicate notification ignored"
                );
                return false;
            }
            PushOutcome::Inserted { evicted } => {
                if let Some(evicted) = evicted {
                    tracing::debug!(notification_id = %evicted.id, "evicted oldest notification");
                }
            }
        }

        tracing::debug!(
            notification_id = %notification.id,
            kind = %notification.kind,
            "notification delivered"
        );

        if self.sound_enabled {
            if let Err(error) = self.sinks.tones.play(Some(notification.kind)) {
                tracing::warn!(error = %error, "tone playback skipped");
            }
        }

        if let Err(error) = self
            .sinks
            .toasts
            .show(Toast::for_notification(&notification, self.toast_duration))
        {
            tracing::warn!(error = %error, "toast not shown");
        }

        if self.sinks.permission.state().is_granted() {
            let native = OsNotification::for_notification(&notification, &self.icon);
            if let Err(error) = self.sinks.permission.show(native) {
                tracing::warn!(error = %error, "native notification not shown");
            }
        }

        self.bus.emit(HubEvent::Delivered { notification });
        true
    }

    pub fn mark_as_read(&self, id: &str) -> bool {
        let changed = self
            .list
            .lock()
            .expect("notification list mutex poisoned")
            .mark_as_read(id);
        if changed {
            self.bus.emit(HubEvent::Read { id: id.to_string() });
        }
        changed
    }

    pub fn clear_all(&self) -> usize {
        let removed = self.list.lock().expect("notification list mutex poisoned").clear();
        self.bus.emit(HubEvent::Cleared { removed });
        removed
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<BusinessNotification> {
        self.list.lock().expect("notification list mutex poisoned").to_vec()
    }

    pub fn unread_count(&self) -> usize {
        self.list
            .lock()
            .expect("notification list mutex poisoned")
            .unread_count()
    }

    pub(crate) fn permission(&self) -> &Arc<dyn PermissionBroker> {
        &self.sinks.permission
    }
}
