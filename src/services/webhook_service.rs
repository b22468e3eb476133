// services/webhook_service.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::database::store::PaymentStore;
use crate::errors::{AppError, Result};
use crate::models::payment::PaymentStatusUpdate;
use crate::models::{scalar_text, timestamp_now};
use crate::models::webhook::{PaymentStatus, WebhookAck, WebhookEvent, WebhookLog};
use crate::services::outbox::{PersistOutbox, PersistTask};

const MISSING_ORDER_REFERENCE: &str = "Missing orderReference";

/// A webhook that passed ingestion and is ready to be persisted.
#[derive(Debug, Clone)]
pub struct IngestedWebhook {
    pub order_reference: String,
    pub status: PaymentStatus,
    pub event: WebhookEvent,
    pub received_at: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    pub logged: bool,
    pub updated: bool,
}

#[derive(Clone)]
pub struct WebhookIngestor {
    store: Arc<dyn PaymentStore>,
    outbox: PersistOutbox,
}

impl WebhookIngestor {
    pub fn new(store: Arc<dyn PaymentStore>, outbox: PersistOutbox) -> Self {
        WebhookIngestor { store, outbox }
    }

    pub fn outbox(&self) -> &PersistOutbox {
        &self.outbox
    }

    /// Parses and classifies a callback. Fails only for payloads that cannot
    /// be tied to a payment.
    pub fn ingest(&self, payload: Value) -> Result<IngestedWebhook> {
        let event = WebhookEvent::from_payload(payload)
            .map_err(|e| AppError::invalid_data(format!("Malformed webhook payload: {}", e)))?;

        let order_reference = event
            .order_reference()
            .map(str::to_string)
            .ok_or_else(|| AppError::invalid_data(MISSING_ORDER_REFERENCE))?;

        let status = PaymentStatus::from_value(event.status.as_ref());

        Ok(IngestedWebhook {
            order_reference,
            status,
            event,
            received_at: timestamp_now(),
        })
    }

    /// Writes the audit row and the payment update. Neither failure is
    /// returned; failed writes go to the outbox for a later attempt.
    pub async fn persist(&self, webhook: &IngestedWebhook) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();

        let log = WebhookLog::from_event(&webhook.event, &webhook.order_reference, &webhook.received_at);
        match self.store.log_webhook(log.clone()).await {
            Ok(()) => {
                info!("Webhook logged for {}", webhook.order_reference);
                outcome.logged = true;
            }
            Err(e) => {
                error!("Failed to log webhook for {}: {}", webhook.order_reference, e);
                self.outbox.enqueue(PersistTask::LogWebhook(log)).await;
            }
        }

        let update = PaymentStatusUpdate {
            order_reference: webhook.order_reference.clone(),
            status: webhook.event.status.as_ref().and_then(scalar_text),
            transaction_id: webhook.event.transaction_id.as_ref().and_then(scalar_text),
            webhook_received_at: webhook.received_at.clone(),
            updated_at: timestamp_now(),
        };
        match self.store.update_payment_status(update.clone()).await {
            Ok(0) => warn!(
                "No payment log updated for {} (missing, or a newer webhook already applied)",
                webhook.order_reference
            ),
            Ok(_) => {
                info!("Payment log updated for {}", webhook.order_reference);
                outcome.updated = true;
            }
            Err(e) => {
                warn!("Could not update payment log for {}: {}", webhook.order_reference, e);
                self.outbox.enqueue(PersistTask::UpdatePayment(update)).await;
            }
        }

        outcome
    }

    /// Full webhook handling. The returned ack is always sent with HTTP 200.
    pub async fn handle(&self, payload: Value) -> WebhookAck {
        info!("=== ClickPesa Webhook Received ===");
        info!("Webhook Data: {}", payload);

        let webhook = match self.ingest(payload) {
            Ok(webhook) => webhook,
            Err(AppError::ValidationError(msg)) if msg == MISSING_ORDER_REFERENCE => {
                error!("Missing orderReference in webhook");
                return WebhookAck::rejected(msg, None);
            }
            Err(e) => {
                error!("Webhook processing error: {}", e);
                return WebhookAck::rejected("Webhook processing failed", Some(e.to_string()));
            }
        };

        self.persist(&webhook).await;
        log_status(&webhook.order_reference, &webhook.status);

        WebhookAck::processed(&webhook.order_reference)
    }
}

fn log_status(order_reference: &str, status: &PaymentStatus) {
    match status {
        PaymentStatus::Completed => info!("✅ Payment {} completed successfully", order_reference),
        PaymentStatus::Failed => info!("❌ Payment {} failed", order_reference),
        PaymentStatus::Pending => info!("⏳ Payment {} is pending", order_reference),
        PaymentStatus::Cancelled => info!("🚫 Payment {} was cancelled", order_reference),
        PaymentStatus::Unknown(raw) => {
            warn!("ℹ️ Payment {} has unmapped status {:?}", order_reference, raw)
        }
    }
}
