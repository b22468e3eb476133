use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payment status as reported by a ClickPesa webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Completed,
    Failed,
    Pending,
    Cancelled,
    /// A status string we have no mapping for, or none at all.
    Unknown(Option<String>),
}

impl PaymentStatus {
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return PaymentStatus::Unknown(None);
        };

        match raw.trim().to_lowercase().as_str() {
            "completed" | "success" | "successful" => PaymentStatus::Completed,
            "failed" | "failure" => PaymentStatus::Failed,
            "pending" | "initiated" => PaymentStatus::Pending,
            "cancelled" | "canceled" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Unknown(Some(raw.to_string())),
        }
    }

    /// Classifies a raw `status` field. Only strings are mapped; any other
    /// JSON type is kept as an unknown status.
    pub fn from_value(raw: Option<&Value>) -> Self {
        match raw {
            None | Some(Value::Null) => PaymentStatus::Unknown(None),
            Some(Value::String(text)) => PaymentStatus::classify(Some(text)),
            Some(other) => PaymentStatus::Unknown(Some(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
            PaymentStatus::Unknown(Some(raw)) => write!(f, "unknown ({})", raw),
            PaymentStatus::Unknown(None) => write!(f, "unknown"),
        }
    }
}

/// Webhook callback body. Only `orderReference` is required; the other
/// fields are taken with whatever JSON type the provider sends, and anything
/// beyond the known fields ends up in `extra`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub transaction_id: Option<Value>,
    pub order_reference: Option<Value>,
    pub amount: Option<Value>,
    pub currency: Option<Value>,
    pub status: Option<Value>,
    pub phone_number: Option<Value>,
    pub timestamp: Option<Value>,
    pub message: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub raw_payload: Value,
}

impl WebhookEvent {
    pub fn from_payload(payload: Value) -> serde_json::Result<Self> {
        let mut event: WebhookEvent = serde_json::from_value(payload.clone())?;
        event.raw_payload = payload;
        Ok(event)
    }

    /// The order reference, if it is a non-blank string.
    pub fn order_reference(&self) -> Option<&str> {
        self.order_reference
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
    }
}

/// Row in the append-only `clickpesa_webhooks` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookLog {
    pub transaction_id: Option<Value>,
    pub order_reference: String,
    pub amount: Option<Value>,
    pub currency: Value,
    pub status: Option<Value>,
    pub phone_number: Option<Value>,
    pub message: Option<Value>,
    pub raw_data: Value,
    pub received_at: String,
}

impl WebhookLog {
    pub fn from_event(event: &WebhookEvent, order_reference: &str, received_at: &str) -> Self {
        WebhookLog {
            transaction_id: event.transaction_id.clone(),
            order_reference: order_reference.to_string(),
            amount: event.amount.clone(),
            currency: event
                .currency
                .clone()
                .filter(|currency| !currency.is_null())
                .unwrap_or_else(|| Value::from(crate::models::payment::CURRENCY)),
            status: event.status.clone(),
            phone_number: event.phone_number.clone(),
            message: event.message.clone(),
            raw_data: event.raw_payload.clone(),
            received_at: received_at.to_string(),
        }
    }
}

/// Body returned to ClickPesa. Always sent with HTTP 200.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_reference: Option<String>,
    pub timestamp: String,
}

impl WebhookAck {
    pub fn processed(order_reference: &str) -> Self {
        WebhookAck {
            success: true,
            message: Some("Webhook received and processed".to_string()),
            error: None,
            order_reference: Some(order_reference.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn rejected(error: impl Into<String>, message: Option<String>) -> Self {
        WebhookAck {
            success: false,
            message,
            error: Some(error.into()),
            order_reference: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(PaymentStatus::classify(Some("COMPLETED")), PaymentStatus::Completed);
        assert_eq!(PaymentStatus::classify(Some("Success")), PaymentStatus::Completed);
        assert_eq!(PaymentStatus::classify(Some("successful")), PaymentStatus::Completed);
        assert_eq!(PaymentStatus::classify(Some("FAILURE")), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::classify(Some("failed")), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::classify(Some("Initiated")), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::classify(Some("pending")), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::classify(Some("canceled")), PaymentStatus::Cancelled);
        assert_eq!(PaymentStatus::classify(Some("CANCELLED")), PaymentStatus::Cancelled);
    }

    #[test]
    fn unmapped_statuses_stay_visible() {
        assert_eq!(
            PaymentStatus::classify(Some("reversed")),
            PaymentStatus::Unknown(Some("reversed".to_string()))
        );
        assert_eq!(PaymentStatus::classify(None), PaymentStatus::Unknown(None));
    }

    #[test]
    fn non_string_status_is_unknown() {
        assert_eq!(
            PaymentStatus::from_value(Some(&json!(3))),
            PaymentStatus::Unknown(Some("3".to_string()))
        );
        assert_eq!(PaymentStatus::from_value(Some(&Value::Null)), PaymentStatus::Unknown(None));
        assert_eq!(
            PaymentStatus::from_value(Some(&json!("SUCCESS"))),
            PaymentStatus::Completed
        );
    }

    #[test]
    fn numeric_optional_fields_are_kept_verbatim() {
        let payload = json!({
            "orderReference": "ORDER1",
            "transactionId": 98765,
            "phoneNumber": 255712345678u64,
            "currency": null
        });
        let event = WebhookEvent::from_payload(payload).unwrap();
        let log = WebhookLog::from_event(&event, "ORDER1", "2026-01-01T00:00:00.000000Z");

        assert_eq!(log.transaction_id, Some(json!(98765)));
        assert_eq!(log.phone_number, Some(json!(255712345678u64)));
        assert_eq!(log.currency, "TZS");
    }

    #[test]
    fn non_string_order_reference_counts_as_missing() {
        let event = WebhookEvent::from_payload(json!({"orderReference": 42})).unwrap();
        assert_eq!(event.order_reference(), None);
    }

    #[test]
    fn event_keeps_raw_payload_and_extra_fields() {
        let payload = json!({
            "orderReference": "ORDER1",
            "status": "completed",
            "amount": 1000,
            "channel": "TIGO-PESA"
        });
        let event = WebhookEvent::from_payload(payload.clone()).unwrap();

        assert_eq!(event.order_reference(), Some("ORDER1"));
        assert_eq!(event.extra["channel"], "TIGO-PESA");
        assert_eq!(event.raw_payload, payload);

        let log = WebhookLog::from_event(&event, "ORDER1", "2026-01-01T00:00:00Z");
        assert_eq!(log.currency, "TZS");
        assert_eq!(log.raw_data, payload);
    }

    #[test]
    fn blank_order_reference_counts_as_missing() {
        let event = WebhookEvent::from_payload(json!({"orderReference": "  "})).unwrap();
        assert_eq!(event.order_reference(), None);
    }
}
