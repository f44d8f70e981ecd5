//! Classifiers turn one typed change into at most one notification each.
//!
//! A source runs its classifiers in order over the same input, so a single
//! change can yield zero, one or several notifications.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::feed::ChangeKind;
use crate::notification::{format_amount, BusinessNotification, NotificationType};

use super::rows::{InvoiceRow, MessageRow};

pub const APPOINTMENT_MARKERS: &[&str] =
    &["Demande de rendez-vous", "souhaite prendre rendez-vous"];

const DEFAULT_CLIENT: &str = "Client";
const DEFAULT_CURRENCY: &str = "FCFA";

pub trait Classifier<I>: Send + Sync {
    fn name(&self) -> &'static str;
    fn classify(&self, input: &I) -> Option<BusinessNotification>;
}

/// Inserted message with its resolved sender label.
#[derive(Debug, Clone)]
pub struct MessageInput {
    pub row: MessageRow,
    pub sender_name: String,
    pub observed_at: DateTime<Utc>,
}

impl MessageInput {
    fn timestamp(&self) -> DateTime<Utc> {
        self.row.created_at.unwrap_or(self.observed_at)
    }

    fn data(&self) -> serde_json::Value {
        json!({
            "message_id": self.row.id,
            "sender_id": self.row.sender_id,
        })
    }
}

/// Invoice change with the previous validation flag.
#[derive(Debug, Clone)]
pub struct InvoiceInput {
    pub kind: ChangeKind,
    pub row: InvoiceRow,
    pub was_validated: bool,
    pub card_name: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl InvoiceInput {
    fn client(&self) -> &str {
        self.row
            .client_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_CLIENT)
    }

    fn money(&self) -> String {
        let currency = self
            .row
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|currency| !currency.is_empty())
            .unwrap_or(DEFAULT_CURRENCY);
        format!("{} {currency}", format_amount(self.row.amount))
    }

    fn data(&self) -> serde_json::Value {
        let mut data = json!({
            "invoice_id": self.row.id,
            "amount": self.row.amount,
            "currency": self.row.currency,
        });
        if let Some(card_name) = &self.card_name {
            data["card_name"] = json!(card_name);
        }
        data
    }
}

pub struct DirectMessageClassifier;

impl Classifier<MessageInput> for DirectMessageClassifier {
    fn name(&self) -> &'static str {
        "direct_message"
    }

    fn classify(&self, input: &MessageInput) -> Option<BusinessNotification> {
        let message = match input.row.subject.as_deref().map(str::trim) {
            Some(subject) if !subject.is_empty() => format!("{}: {subject}", input.sender_name),
            _ => format!("{} vous a envoyé un message", input.sender_name),
        };
        Some(
            BusinessNotification::new(
                NotificationType::NewMessage,
                &input.row.id,
                "Nouveau message",
                message,
                input.timestamp(),
            )
            .with_data(input.data()),
        )
    }
}

pub struct AppointmentClassifier;

impl AppointmentClassifier {
    pub fn is_appointment(row: &MessageRow) -> bool {
        [row.subject.as_deref(), row.content.as_deref()]
            .into_iter()
            .flatten()
            .any(|text| APPOINTMENT_MARKERS.iter().any(|marker| text.contains(marker)))
    }
}

impl Classifier<MessageInput> for AppointmentClassifier {
    fn name(&self) -> &'static str {
        "appointment"
    }

    fn classify(&self, input: &MessageInput) -> Option<BusinessNotification> {
        if !Self::is_appointment(&input.row) {
            return None;
        }
        Some(
            BusinessNotification::new(
                NotificationType::NewAppointment,
                &input.row.id,
                "Nouvelle demande de rendez-vous",
                format!("{} souhaite prendre rendez-vous", input.sender_name),
                input.timestamp(),
            )
            .with_data(input.data()),
        )
    }
}

pub struct SaleClassifier;

impl Classifier<InvoiceInput> for SaleClassifier {
    fn name(&self) -> &'static str {
        "sale"
    }

    fn classify(&self, input: &InvoiceInput) -> Option<BusinessNotification> {
        if input.kind != ChangeKind::Insert {
            return None;
        }
        Some(
            BusinessNotification::new(
                NotificationType::NewSale,
                &input.row.id,
                "Nouvelle vente",
                format!("{} - {}", input.client(), input.money()),
                input.row.created_at.unwrap_or(input.observed_at),
            )
            .with_data(input.data()),
        )
    }
}

/// Fires only on the `is_validated` false -> true transition.
pub struct PaymentClassifier;

impl Classifier<InvoiceInput> for PaymentClassifier {
    fn name(&self) -> &'static str {
        "payment"
    }

    fn classify(&self, input: &InvoiceInput) -> Option<BusinessNotification> {
        if input.kind != ChangeKind::Update || !input.row.is_validated || input.was_validated {
            return None;
        }
        let timestamp = input
            .row
            .validated_at
            .or(input.row.updated_at)
            .unwrap_or(input.observed_at);
        Some(
            BusinessNotification::new(
                NotificationType::PaymentReceived,
                &input.row.id,
                "Paiement reçu",
                format!("{} a réglé {}", input.client(), input.money()),
                timestamp,
            )
            .with_data(input.data()),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn message(subject: Option<&str>, content: Option<&str>) -> MessageInput {
        MessageInput {
            row: MessageRow {
                id: "m1".to_string(),
                sender_id: Some("u2".to_string()),
                recipient_id: Some("u1".to_string()),
                subject: subject.map(str::to_string),
                content: content.map(str::to_string),
                created_at: None,
            },
            sender_name: "Awa Diop".to_string(),
            observed_at: Utc::now(),
        }
    }

    fn invoice(kind: ChangeKind, is_validated: bool, was_validated: bool) -> InvoiceInput {
        InvoiceInput {
            kind,
            row: InvoiceRow {
                id: "inv1".to_string(),
                mcard_id: Some("c1".to_string()),
                client_name: Some("Amina".to_string()),
                amount: 15000.0,
                currency: Some("FCFA".to_string()),
                is_validated,
                created_at: None,
                validated_at: None,
                updated_at: None,
            },
            was_validated,
            card_name: None,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn direct_message_uses_subject_when_present() {
        let with_subject = DirectMessageClassifier
            .classify(&message(Some("Question"), None))
            .unwrap();
        assert_eq!(with_subject.id, "msg_m1");
        assert_eq!(with_subject.kind, NotificationType::NewMessage);
        assert_eq!(with_subject.message, "Awa Diop: Question");

        let bare = DirectMessageClassifier.classify(&message(None, Some("salut"))).unwrap();
        assert_eq!(bare.message, "Awa Diop vous a envoyé un message");
        assert_eq!(bare.data["message_id"], "m1");
    }

    #[test]
    fn appointment_matches_subject_or_body() {
        let by_subject = message(Some("Demande de rendez-vous"), None);
        let by_body = message(None, Some("Bonjour, Awa souhaite prendre rendez-vous demain"));
        let plain = message(Some("Devis"), Some("Combien ?"));

        assert_eq!(
            AppointmentClassifier.classify(&by_subject).map(|n| n.id),
            Some("rdv_m1".to_string())
        );
        assert!(AppointmentClassifier.classify(&by_body).is_some());
        assert!(AppointmentClassifier.classify(&plain).is_none());
    }

    #[test]
    fn sale_only_on_insert() {
        let sale = SaleClassifier
            .classify(&invoice(ChangeKind::Insert, false, false))
            .unwrap();
        assert_eq!(sale.id, "sale_inv1");
        assert_eq!(sale.kind, NotificationType::NewSale);
        assert!(sale.message.contains("Amina"));
        assert!(sale.message.contains("15 000"));
        assert!(sale.message.contains("FCFA"));

        assert!(SaleClassifier.classify(&invoice(ChangeKind::Update, true, false)).is_none());
    }

    #[test]
    fn payment_only_on_validation_transition() {
        let paid = PaymentClassifier
            .classify(&invoice(ChangeKind::Update, true, false))
            .unwrap();
        assert_eq!(paid.id, "payment_inv1");
        assert_eq!(paid.kind, NotificationType::PaymentReceived);

        assert!(PaymentClassifier.classify(&invoice(ChangeKind::Update, true, true)).is_none());
        assert!(PaymentClassifier.classify(&invoice(ChangeKind::Update, false, false)).is_none());
        assert!(PaymentClassifier.classify(&invoice(ChangeKind::Insert, true, false)).is_none());
    }

    #[test]
    fn invoice_defaults_fill_missing_fields() {
        let mut input = invoice(ChangeKind::Insert, false, false);
        input.row.client_name = Some("  ".to_string());
        input.row.currency = None;
        input.card_name = Some("Boutique".to_string());

        let sale = SaleClassifier.classify(&input).unwrap();
        assert_eq!(sale.message, "Client - 15 000 FCFA");
        assert_eq!(sale.data["card_name"], "Boutique");
    }
}
