//! Side-effecting delivery surfaces: sound, toast and native notification.
//!
//! Each surface sits behind a trait injected into the hub. Every call is
//! best-effort; the hub logs failures and moves on.

pub mod os;
pub mod toast;
pub mod tone;

pub use os::{OsNotification, PermissionBroker, PermissionState, UnsupportedPermissionBroker};
pub use toast::{Toast, ToastSink, TracingToastSink, DEFAULT_TOAST_DURATION};
pub use tone::{
    pattern_for, AudioOutput, SynthToneEmitter, ToneClip, ToneEmitter, TonePattern, ToneStep,
    Waveform,
};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("audio unavailable: {0}")]
    Audio(String),
    #[error("toast failed: {0}")]
    Toast(String),
    #[error("native notification failed: {0}")]
    Os(String),
}
