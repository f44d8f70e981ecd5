use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::notification::BusinessNotification;

use super::DeliveryError;

/// OS-level notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Not decided yet; the user can still be prompted.
    Default,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Native desktop/mobile notification. The OS collapses entries that share a
/// `tag`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub tag: String,
}

impl OsNotification {
    pub fn for_notification(notification: &BusinessNotification, icon: &str) -> Self {
        Self {
            title: notification.title.clone(),
            body: notification.message.clone(),
            icon: icon.to_string(),
            tag: notification.id.clone(),
        }
    }
}

/// Process-wide notification permission and native notification display.
#[async_trait]
pub trait PermissionBroker: Send + Sync {
    fn state(&self) -> PermissionState;

    /// Prompt the user. Only called while the state is `Default`.
    async fn request(&self) -> Result<PermissionState, DeliveryError>;

    fn show(&self, notification: OsNotification) -> Result<(), DeliveryError>;
}

/// Broker for environments without native notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedPermissionBroker;

#[async_trait]
impl PermissionBroker for UnsupportedPermissionBroker {
    fn state(&self) -> PermissionState {
        PermissionState::Denied
    }

    async fn request(&self) -> Result<PermissionState, DeliveryError> {
        Ok(PermissionState::Denied)
    }

    fn show(&self, _notification: OsNotification) -> Result<(), DeliveryError> {
        Err(DeliveryError::Os("native notifications unsupported".to_string()))
    }
}
