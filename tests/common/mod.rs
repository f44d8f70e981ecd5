// tests/common/mod.rs
//! Common test utilities for hub integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use finderid_notifier::bus::{BusEvent, HubEvent};
use finderid_notifier::delivery::{
    AudioOutput, DeliveryError, OsNotification, PermissionBroker, PermissionState,
    SynthToneEmitter, Toast, ToastSink, ToneClip,
};
use finderid_notifier::directory::{CardInfo, InMemoryDirectory};
use finderid_notifier::feed::InMemoryChangeFeed;
use finderid_notifier::{BusinessNotification, DeliverySinks, NotificationHub, NotifierSettings};
use tokio::sync::broadcast;

#[derive(Default)]
pub struct CapturedAudio {
    pub clips: Mutex<Vec<ToneClip>>,
}

impl AudioOutput for CapturedAudio {
    fn write(&self, clip: &ToneClip) -> Result<(), DeliveryError> {
        self.clips.lock().unwrap().push(clip.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct CapturedToasts {
    pub toasts: Mutex<Vec<Toast>>,
}

impl ToastSink for CapturedToasts {
    fn show(&self, toast: Toast) -> Result<(), DeliveryError> {
        self.toasts.lock().unwrap().push(toast);
        Ok(())
    }
}

pub struct GrantedBroker {
    pub shown: Mutex<Vec<OsNotification>>,
}

#[async_trait]
impl PermissionBroker for GrantedBroker {
    fn state(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn request(&self) -> Result<PermissionState, DeliveryError> {
        Ok(PermissionState::Granted)
    }

    fn show(&self, notification: OsNotification) -> Result<(), DeliveryError> {
        self.shown.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct Harness {
    pub hub: NotificationHub,
    pub feed: Arc<InMemoryChangeFeed>,
    pub tones: Arc<SynthToneEmitter<CapturedAudio>>,
    pub toasts: Arc<CapturedToasts>,
    pub broker: Arc<GrantedBroker>,
    pub events: broadcast::Receiver<BusEvent>,
}

pub fn harness() -> Harness {
    let directory = InMemoryDirectory::new();
    directory.insert_user("visitor-1", "Awa Diop");
    directory.insert_card(CardInfo {
        id: "card-1".to_string(),
        full_name: Some("Boutique Amina".to_string()),
        user_id: Some("owner-1".to_string()),
    });

    let feed = Arc::new(InMemoryChangeFeed::new());
    let tones = Arc::new(SynthToneEmitter::new(CapturedAudio::default()).with_sample_rate(8_000));
    let toasts = Arc::new(CapturedToasts::default());
    let broker = Arc::new(GrantedBroker {
        shown: Mutex::new(Vec::new()),
    });

    let sinks = DeliverySinks {
        tones: tones.clone(),
        toasts: toasts.clone(),
        permission: broker.clone(),
    };
    let hub = NotificationHub::new(
        NotifierSettings::default(),
        feed.clone(),
        Arc::new(directory),
        sinks,
    );
    let events = hub.subscribe();

    Harness {
        hub,
        feed,
        tones,
        toasts,
        broker,
        events,
    }
}

/// Wait for the next delivered notification on the hub bus.
pub async fn next_delivered(events: &mut broadcast::Receiver<BusEvent>) -> BusinessNotification {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("timed out waiting for a delivery")
            .expect("hub bus closed");
        if let HubEvent::Delivered { notification } = event.event {
            return notification;
        }
    }
}
