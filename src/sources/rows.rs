use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Row image of the `messages` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row image of the `invoices` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub id: String,
    #[serde(default)]
    pub mcard_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub is_validated: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Numeric columns may arrive as JSON numbers or as decimal strings.
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(number) => Ok(number.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid amount {raw:?}: {e}"))),
        serde_json::Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!("invalid amount: {other}"))),
    }
}

/// Value of a boolean column in a row image, `false` when absent.
pub(crate) fn flag(image: &serde_json::Value, column: &str) -> bool {
    image.get(column).and_then(|value| value.as_bool()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn invoice_amount_accepts_numbers_and_strings() {
        let from_number: InvoiceRow =
            serde_json::from_value(json!({"id": "a", "amount": 15000})).unwrap();
        let from_string: InvoiceRow =
            serde_json::from_value(json!({"id": "b", "amount": "2500.50"})).unwrap();
        let missing: InvoiceRow = serde_json::from_value(json!({"id": "c"})).unwrap();

        assert_eq!(from_number.amount, 15000.0);
        assert_eq!(from_string.amount, 2500.5);
        assert_eq!(missing.amount, 0.0);
        assert!(!missing.is_validated);
    }

    #[test]
    fn invoice_rejects_garbage_amount() {
        let result: Result<InvoiceRow, _> =
            serde_json::from_value(json!({"id": "a", "amount": "lots"}));
        assert!(result.is_err());
    }

    #[test]
    fn flag_defaults_to_false() {
        assert!(flag(&json!({"is_validated": true}), "is_validated"));
        assert!(!flag(&json!({"id": "x"}), "is_validated"));
        assert!(!flag(&serde_json::Value::Null, "is_validated"));
    }
}
