//! Event source adapters.
//!
//! Each source owns one feed channel: it names the channel, declares its
//! filters and translates raw change records into notifications by running
//! its classifiers in order.
//!
//! - `MessageSource`: inserts into `messages` addressed to the current user.
//!   One insert may yield a `new_message` and a `new_appointment`.
//! - `InvoiceSource`: inserts (sales) and updates (payments) on `invoices`
//!   for the current card.

pub mod classifiers;
mod rows;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::directory::Directory;
use crate::feed::{ChangeEvent, ChangeFilter, ChangeKind};
use crate::notification::BusinessNotification;

use classifiers::{
    AppointmentClassifier, Classifier, DirectMessageClassifier, InvoiceInput, MessageInput,
    PaymentClassifier, SaleClassifier,
};
pub use rows::{InvoiceRow, MessageRow};

pub const MESSAGES_TABLE: &str = "messages";
pub const MESSAGES_RECIPIENT_COLUMN: &str = "recipient_id";
pub const INVOICES_TABLE: &str = "invoices";
pub const INVOICES_CARD_COLUMN: &str = "mcard_id";
const VALIDATED_COLUMN: &str = "is_validated";

#[async_trait]
pub trait EventSource: Send + Sync {
    fn channel(&self) -> String;
    fn filters(&self) -> Vec<ChangeFilter>;
    /// Never fails: malformed records and lookup errors degrade to fewer or
    /// more generic notifications.
    async fn translate(&self, event: &ChangeEvent) -> Vec<BusinessNotification>;
}

fn run_classifiers<I>(
    classifiers: &[Box<dyn Classifier<I>>],
    input: &I,
) -> Vec<BusinessNotification> {
    classifiers
        .iter()
        .filter_map(|classifier| {
            let notification = classifier.classify(input)?;
            tracing::debug!(
                classifier = classifier.name(),
                notification_id = %notification.id,
                "change classified"
            );
            Some(notification)
        })
        .collect()
}

pub struct MessageSource {
    user_id: String,
    directory: Arc<dyn Directory>,
    fallback_sender: String,
    classifiers: Vec<Box<dyn Classifier<MessageInput>>>,
}

impl MessageSource {
    pub fn new(
        user_id: impl Into<String>,
        directory: Arc<dyn Directory>,
        fallback_sender: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            directory,
            fallback_sender: fallback_sender.into(),
            classifiers: vec![Box::new(DirectMessageClassifier), Box::new(AppointmentClassifier)],
        }
    }

    async fn sender_label(&self, sender_id: Option<&str>) -> String {
        let Some(sender_id) = sender_id else {
            return self.fallback_sender.clone();
        };
        match self.directory.sender_name(sender_id).await {
            Ok(Some(name)) => name,
            Ok(None) => self.fallback_sender.clone(),
            Err(error) => {
                tracing::warn!(
                    sender_id,
                    error = %error,
                    "sender lookup failed, using fallback label"
                );
                self.fallback_sender.clone()
            }
        }
    }
}

#[async_trait]
impl EventSource for MessageSource {
    fn channel(&self) -> String {
        format!("business-messages-{}", self.user_id)
    }

    fn filters(&self) -> Vec<ChangeFilter> {
        vec![ChangeFilter::new(
            MESSAGES_TABLE,
            ChangeKind::Insert,
            MESSAGES_RECIPIENT_COLUMN,
            self.user_id.clone(),
        )]
    }

    async fn translate(&self, event: &ChangeEvent) -> Vec<BusinessNotification> {
        if event.event_type != ChangeKind::Insert {
            return Vec::new();
        }
        let row: MessageRow = match serde_json::from_value(event.new.clone()) {
            Ok(row) => row,
            Err(error) => {
                tracing::warn!(error = %error, "skipping malformed message record");
                return Vec::new();
            }
        };

        let sender_name = self.sender_label(row.sender_id.as_deref()).await;
        let input = MessageInput {
            row,
            sender_name,
            observed_at: event.commit_timestamp.unwrap_or_else(Utc::now),
        };
        run_classifiers(&self.classifiers, &input)
    }
}

pub struct InvoiceSource {
    mcard_id: String,
    card_name: Option<String>,
    classifiers: Vec<Box<dyn Classifier<InvoiceInput>>>,
}

impl InvoiceSource {
    pub fn new(mcard_id: impl Into<String>) -> Self {
        Self {
            mcard_id: mcard_id.into(),
            card_name: None,
            classifiers: vec![Box::new(SaleClassifier), Box::new(PaymentClassifier)],
        }
    }

    /// Resolve the card display name once, for notification context.
    pub async fn with_card_context(mut self, directory: &dyn Directory) -> Self {
        match directory.card_info(&self.mcard_id).await {
            Ok(Some(card)) => self.card_name = card.full_name,
            Ok(None) => tracing::debug!(mcard_id = %self.mcard_id, "card not found"),
            Err(error) => {
                tracing::warn!(mcard_id = %self.mcard_id, error = %error, "card lookup failed")
            }
        }
        self
    }

    pub fn card_name(&self) -> Option<&str> {
        self.card_name.as_deref()
    }
}

#[async_trait]
impl EventSource for InvoiceSource {
    fn channel(&self) -> String {
        format!("business-invoices-{}", self.mcard_id)
    }

    fn filters(&self) -> Vec<ChangeFilter> {
        vec![
            ChangeFilter::new(
                INVOICES_TABLE,
                ChangeKind::Insert,
                INVOICES_CARD_COLUMN,
                self.mcard_id.clone(),
            ),
            ChangeFilter::new(
                INVOICES_TABLE,
                ChangeKind::Update,
                INVOICES_CARD_COLUMN,
                self.mcard_id.clone(),
            ),
        ]
    }

    async fn translate(&self, event: &ChangeEvent) -> Vec<BusinessNotification> {
        let row: InvoiceRow = match serde_json::from_value(event.new.clone()) {
            Ok(row) => row,
            Err(error) => {
                tracing::warn!(error = %error, "skipping malformed invoice record");
                return Vec::new();
            }
        };

        let input = InvoiceInput {
            kind: event.event_type,
            row,
            was_validated: rows::flag(&event.old, VALIDATED_COLUMN),
            card_name: self.card_name.clone(),
            observed_at: event.commit_timestamp.unwrap_or_else(Utc::now),
        };
        run_classifiers(&self.classifiers, &input)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::directory::{CardInfo, InMemoryDirectory};
    use crate::notification::NotificationType;

    fn directory() -> Arc<InMemoryDirectory> {
        let directory = InMemoryDirectory::new();
        directory.insert_user("u2", "Awa Diop");
        directory.insert_card(CardInfo {
            id: "c1".to_string(),
            full_name: Some("Boutique Amina".to_string()),
            user_id: Some("u1".to_string()),
        });
        Arc::new(directory)
    }

    #[tokio::test]
    async fn message_insert_yields_message_notification() {
        let source = MessageSource::new("u1", directory(), "Un visiteur");
        let event = ChangeEvent::insert(
            MESSAGES_TABLE,
            json!({"id": "m1", "sender_id": "u2", "recipient_id": "u1", "subject": "Bonjour"}),
        );

        let out = source.translate(&event).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "msg_m1");
        assert_eq!(out[0].message, "Awa Diop: Bonjour");
    }

    #[tokio::test]
    async fn appointment_message_fans_out_to_two_notifications() {
        let source = MessageSource::new("u1", directory(), "Un visiteur");
        let event = ChangeEvent::insert(
            MESSAGES_TABLE,
            json!({
                "id": "m7",
                "sender_id": "u2",
                "recipient_id": "u1",
                "subject": "Demande de rendez-vous",
                "content": "Disponible jeudi ?"
            }),
        );

        let kinds: Vec<NotificationType> = source
            .translate(&event)
            .await
            .into_iter()
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![NotificationType::NewMessage, NotificationType::NewAppointment]
        );
    }

    #[tokio::test]
    async fn unknown_sender_gets_fallback_label() {
        let source = MessageSource::new("u1", directory(), "Un visiteur");
        let event = ChangeEvent::insert(
            MESSAGES_TABLE,
            json!({"id": "m2", "sender_id": "nobody", "recipient_id": "u1"}),
        );

        let out = source.translate(&event).await;
        assert_eq!(out[0].message, "Un visiteur vous a envoyé un message");
    }

    #[tokio::test]
    async fn malformed_message_is_skipped() {
        let source = MessageSource::new("u1", directory(), "Un visiteur");
        let event = ChangeEvent::insert(MESSAGES_TABLE, json!({"recipient_id": "u1"}));
        assert!(source.translate(&event).await.is_empty());
    }

    #[tokio::test]
    async fn invoice_source_tracks_validation_transition() {
        let source = InvoiceSource::new("c1").with_card_context(directory().as_ref()).await;
        assert_eq!(source.card_name(), Some("Boutique Amina"));

        let row = json!({
            "id": "inv1",
            "mcard_id": "c1",
            "client_name": "Amina",
            "amount": 15000,
            "currency": "FCFA",
            "is_validated": false
        });
        let mut validated = row.clone();
        validated["is_validated"] = json!(true);

        let sale = source.translate(&ChangeEvent::insert(INVOICES_TABLE, row.clone())).await;
        assert_eq!(sale.len(), 1);
        assert_eq!(sale[0].id, "sale_inv1");
        assert_eq!(sale[0].data["card_name"], "Boutique Amina");

        let paid = source
            .translate(&ChangeEvent::update(INVOICES_TABLE, row, validated.clone()))
            .await;
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, "payment_inv1");

        let again = source
            .translate(&ChangeEvent::update(INVOICES_TABLE, validated.clone(), validated))
            .await;
        assert!(again.is_empty());
    }

    #[test]
    fn channels_are_scoped_by_identifier() {
        let messages = MessageSource::new("u1", directory(), "Un visiteur");
        let invoices = InvoiceSource::new("c1");
        assert_eq!(messages.channel(), "business-messages-u1");
        assert_eq!(messages.filters()[0].expression(), "recipient_id=eq.u1");
        assert_eq!(invoices.filters().len(), 2);
    }
}
