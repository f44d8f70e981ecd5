//! Recording fakes for the delivery surfaces, a failing directory and a
//! feed that rejects selected channels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::delivery::{
    DeliveryError, OsNotification, PermissionBroker, PermissionState, Toast, ToastSink,
    ToneEmitter,
};
use crate::directory::{CardInfo, Directory, DirectoryError};
use crate::feed::{ChangeFeed, ChangeFilter, FeedError, FeedSubscription, InMemoryChangeFeed};
use crate::hub::DeliverySinks;
use crate::notification::NotificationType;

#[derive(Default)]
pub struct RecordingTones {
    pub played: Mutex<Vec<Option<NotificationType>>>,
    pub fail: AtomicBool,
}

impl ToneEmitter for RecordingTones {
    fn play(&self, kind: Option<NotificationType>) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Audio("blocked".to_string()));
        }
        self.played.lock().unwrap().push(kind);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingToasts {
    pub shown: Mutex<Vec<Toast>>,
}

impl ToastSink for RecordingToasts {
    fn show(&self, toast: Toast) -> Result<(), DeliveryError> {
        self.shown.lock().unwrap().push(toast);
        Ok(())
    }
}

pub struct FakePermission {
    pub state: Mutex<PermissionState>,
    pub answer: PermissionState,
    pub requests: Mutex<usize>,
    pub shown: Mutex<Vec<OsNotification>>,
}

impl FakePermission {
    pub fn new(state: PermissionState, answer: PermissionState) -> Self {
        Self {
            state: Mutex::new(state),
            answer,
            requests: Mutex::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PermissionBroker for FakePermission {
    fn state(&self) -> PermissionState {
        *self.state.lock().unwrap()
    }

    async fn request(&self) -> Result<PermissionState, DeliveryError> {
        *self.requests.lock().unwrap() += 1;
        *self.state.lock().unwrap() = self.answer;
        Ok(self.answer)
    }

    fn show(&self, notification: OsNotification) -> Result<(), DeliveryError> {
        self.shown.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct FailingDirectory;

#[async_trait]
impl Directory for FailingDirectory {
    async fn sender_name(&self, _user_id: &str) -> Result<Option<String>, DirectoryError> {
        Err(DirectoryError::Timeout("lookup timed out".to_string()))
    }

    async fn card_info(&self, _mcard_id: &str) -> Result<Option<CardInfo>, DirectoryError> {
        Err(DirectoryError::Timeout("lookup timed out".to_string()))
    }
}

/// Delegates to an in-memory feed but refuses channels starting with
/// `rejected_prefix`.
pub struct RejectingFeed {
    pub inner: Arc<InMemoryChangeFeed>,
    pub rejected_prefix: &'static str,
}

#[async_trait]
impl ChangeFeed for RejectingFeed {
    async fn subscribe(
        &self,
        channel: &str,
        filters: Vec<ChangeFilter>,
    ) -> Result<FeedSubscription, FeedError> {
        if channel.starts_with(self.rejected_prefix) {
            return Err(FeedError::Subscribe(format!("channel {channel} refused")));
        }
        self.inner.subscribe(channel, filters).await
    }

    async fn remove_channel(&self, subscription: FeedSubscription) -> Result<(), FeedError> {
        self.inner.remove_channel(subscription).await
    }
}

pub struct Recorders {
    pub tones: Arc<RecordingTones>,
    pub toasts: Arc<RecordingToasts>,
    pub permission: Arc<FakePermission>,
}

impl Recorders {
    pub fn new(permission: PermissionState) -> Self {
        Self {
            tones: Arc::new(RecordingTones::default()),
            toasts: Arc::new(RecordingToasts::default()),
            permission: Arc::new(FakePermission::new(permission, PermissionState::Granted)),
        }
    }

    pub fn sinks(&self) -> DeliverySinks {
        DeliverySinks {
            tones: self.tones.clone(),
            toasts: self.toasts.clone(),
            permission: self.permission.clone(),
        }
    }
}
