use std::time::Duration;

use serde::Serialize;

use crate::notification::BusinessNotification;

use super::DeliveryError;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

impl Toast {
    /// Toast for a notification: title prefixed with the type emoji.
    pub fn for_notification(notification: &BusinessNotification, duration: Duration) -> Self {
        Self {
            title: format!("{} {}", notification.kind.emoji(), notification.title),
            description: notification.message.clone(),
            duration,
        }
    }
}

/// Fire-and-forget on-screen toast surface.
pub trait ToastSink: Send + Sync {
    fn show(&self, toast: Toast) -> Result<(), DeliveryError>;
}

/// Writes toasts to the log. Used where no screen is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingToastSink;

impl ToastSink for TracingToastSink {
    fn show(&self, toast: Toast) -> Result<(), DeliveryError> {
        tracing::info!(
            title = %toast.title,
            duration_ms = toast.duration.as_millis() as u64,
            "{}",
            toast.description
        );
        Ok(())
    }
}
