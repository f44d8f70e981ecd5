use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a business notification. Drives the tone, the toast emoji and
/// the id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewMessage,
    NewAppointment,
    NewSale,
    PaymentReceived,
    NewClient,
}

impl NotificationType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::NewAppointment => "new_appointment",
            Self::NewSale => "new_sale",
            Self::PaymentReceived => "payment_received",
            Self::NewClient => "new_client",
        }
    }

    pub const fn all() -> &'static [NotificationType] {
        &[
            NotificationType::NewMessage,
            NotificationType::NewAppointment,
            NotificationType::NewSale,
            NotificationType::PaymentReceived,
            NotificationType::NewClient,
        ]
    }

    /// Prefix used to derive a notification id from its source record id.
    pub const fn id_prefix(&self) -> &'static str {
        match self {
            Self::NewMessage => "msg",
            Self::NewAppointment => "rdv",
            Self::NewSale => "sale",
            Self::PaymentReceived => "payment",
            Self::NewClient => "client",
        }
    }

    /// Emoji prepended to toast titles.
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::NewMessage => "💬",
            Self::NewAppointment => "📅",
            Self::NewSale => "💰",
            Self::PaymentReceived => "✅",
            Self::NewClient => "👤",
        }
    }

    pub fn notification_id(&self, source_id: &str) -> String {
        format!("{}_{}", self.id_prefix(), source_id)
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new_message" => Ok(Self::NewMessage),
            "new_appointment" => Ok(Self::NewAppointment),
            "new_sale" => Ok(Self::NewSale),
            "payment_received" => Ok(Self::PaymentReceived),
            "new_client" => Ok(Self::NewClient),
            _ => Err(format!("unknown notification type: {value}")),
        }
    }
}

/// A transient, in-memory alert describing a noteworthy business event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Source identifiers for navigation. Never interpreted here.
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub is_read: bool,
}

impl BusinessNotification {
    /// Build an unread notification whose id is derived from `source_id`.
    pub fn new(
        kind: NotificationType,
        source_id: &str,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: kind.notification_id(source_id),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp,
            data: serde_json::Value::Null,
            is_read: false,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Format an amount the way the product displays money: space-grouped
/// thousands, comma decimal separator, at most two decimals.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return "0".to_string();
    }

    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative && cents > 0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if fraction > 0 {
        let decimals = format!("{fraction:02}");
        out.push(',');
        out.push_str(decimals.trim_end_matches('0'));
    }
    out
}
