use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::errors::{AppError, Result};
use crate::models::{scalar_text, timestamp_now};

pub const CURRENCY: &str = "TZS";

/// Body of `POST /payment/initiate` as the client sends it.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentBody {
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    pub amount: Value,

    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(length(min = 1, code = "required", message = "phoneNumber is required"))]
    pub phone_number: String,

    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(length(min = 1, code = "required", message = "orderReference is required"))]
    pub order_reference: String,

    #[serde(default)]
    pub checksum: Option<String>,
}

/// Numbers are taken in their written form; `null` reads as absent.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ (Value::Null | Value::String(_) | Value::Number(_)) => {
            Ok(scalar_text(&value).unwrap_or_default())
        }
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

fn validate_amount(amount: &Value) -> std::result::Result<(), ValidationError> {
    if parse_amount(amount).is_some() {
        return Ok(());
    }

    let missing = match amount {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    };
    let (code, message) = if missing {
        ("required", "amount is required")
    } else {
        ("amount", "amount must be a number")
    };
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    Err(error)
}

/// Accepts a JSON number or a numeric string. No range checking.
fn parse_amount(amount: &Value) -> Option<Decimal> {
    match amount {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .ok(),
        Value::String(text) if !text.trim().is_empty() => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

/// A validated payment submission. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub phone_number: String,
    pub order_reference: String,
    pub checksum: Option<String>,
}

impl TryFrom<InitiatePaymentBody> for PaymentRequest {
    type Error = AppError;

    fn try_from(body: InitiatePaymentBody) -> Result<Self> {
        body.validate()?;

        let amount = parse_amount(&body.amount)
            .ok_or_else(|| AppError::invalid_data("amount is required and must be a number"))?;

        Ok(PaymentRequest {
            amount,
            phone_number: body.phone_number,
            order_reference: body.order_reference,
            checksum: body.checksum.filter(|c| !c.is_empty()),
        })
    }
}

impl PaymentRequest {
    pub fn to_ussd_push_payload(&self) -> UssdPushPayload {
        UssdPushPayload {
            amount: self.amount,
            currency: CURRENCY.to_string(),
            order_reference: self.order_reference.clone(),
            phone_number: self.phone_number.clone(),
            checksum: self.checksum.clone(),
        }
    }
}

/// Payload sent to the USSD-push endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdPushPayload {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub order_reference: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Row in the `payment_logs` collection, one per initiated payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentLog {
    pub order_reference: String,
    pub amount: String,
    pub phone_number: String,
    pub status: String,
    pub response: Option<Value>,
    pub transaction_id: Option<String>,
    pub webhook_received_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PaymentLog {
    pub fn initiated(request: &PaymentRequest, response: &Value) -> Self {
        let now = timestamp_now();
        PaymentLog {
            order_reference: request.order_reference.clone(),
            amount: request.amount.to_string(),
            phone_number: request.phone_number.clone(),
            status: "initiated".to_string(),
            response: Some(response.clone()),
            transaction_id: None,
            webhook_received_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Unconditional update applied to a `payment_logs` row by order reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatusUpdate {
    pub order_reference: String,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
    pub webhook_received_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> InitiatePaymentBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_numeric_and_string_amounts() {
        let request = PaymentRequest::try_from(body(json!({
            "amount": 1000,
            "phoneNumber": "255712345678",
            "orderReference": "ORDER1"
        })))
        .unwrap();
        assert_eq!(request.amount, Decimal::from(1000));

        let request = PaymentRequest::try_from(body(json!({
            "amount": "2500.50",
            "phoneNumber": "255712345678",
            "orderReference": "ORDER2"
        })))
        .unwrap();
        assert_eq!(request.amount, Decimal::from_str("2500.50").unwrap());
    }

    #[test]
    fn rejects_missing_or_empty_fields() {
        let cases = [
            json!({"phoneNumber": "255712345678", "orderReference": "ORDER1"}),
            json!({"amount": "", "phoneNumber": "255712345678", "orderReference": "ORDER1"}),
            json!({"amount": 1000, "orderReference": "ORDER1"}),
            json!({"amount": 1000, "phoneNumber": "", "orderReference": "ORDER1"}),
            json!({"amount": 1000, "phoneNumber": "255712345678"}),
            json!({"amount": 1000, "phoneNumber": "255712345678", "orderReference": ""}),
        ];

        for case in cases {
            let result = PaymentRequest::try_from(body(case.clone()));
            assert!(
                matches!(result, Err(AppError::MissingFields(_))),
                "expected missing fields error for {case}"
            );
        }
    }

    #[test]
    fn non_numeric_amount_is_invalid_not_missing() {
        let result = PaymentRequest::try_from(body(json!({
            "amount": "ten",
            "phoneNumber": "255712345678",
            "orderReference": "ORDER1"
        })));
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn numeric_phone_and_reference_become_text() {
        let request = PaymentRequest::try_from(body(json!({
            "amount": 1000,
            "phoneNumber": 255712345678u64,
            "orderReference": 42
        })))
        .unwrap();
        assert_eq!(request.phone_number, "255712345678");
        assert_eq!(request.order_reference, "42");
    }

    #[test]
    fn structured_phone_number_is_rejected() {
        let result: serde_json::Result<InitiatePaymentBody> = serde_json::from_value(json!({
            "amount": 1000,
            "phoneNumber": {"msisdn": "255712345678"},
            "orderReference": "ORDER1"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn zero_and_negative_amounts_pass_through() {
        let request = PaymentRequest::try_from(body(json!({
            "amount": -5,
            "phoneNumber": "x",
            "orderReference": "y"
        })))
        .unwrap();
        assert_eq!(request.amount, Decimal::from(-5));
    }

    #[test]
    fn checksum_only_serialized_when_present() {
        let mut request = PaymentRequest {
            amount: Decimal::from(1000),
            phone_number: "255712345678".to_string(),
            order_reference: "ORDER1".to_string(),
            checksum: None,
        };
        let payload = serde_json::to_value(request.to_ussd_push_payload()).unwrap();
        assert!(payload.get("checksum").is_none());
        assert_eq!(payload["currency"], "TZS");
        assert_eq!(payload["amount"], json!(1000.0));

        request.checksum = Some("abc123".to_string());
        let payload = serde_json::to_value(request.to_ussd_push_payload()).unwrap();
        assert_eq!(payload["checksum"], "abc123");
    }

    #[test]
    fn empty_checksum_is_dropped() {
        let request = PaymentRequest::try_from(body(json!({
            "amount": 1000,
            "phoneNumber": "255712345678",
            "orderReference": "ORDER1",
            "checksum": ""
        })))
        .unwrap();
        assert_eq!(request.checksum, None);
    }
}
