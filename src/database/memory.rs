use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::store::PaymentStore;
use crate::errors::Result;
use crate::models::payment::{PaymentLog, PaymentStatusUpdate};
use crate::models::webhook::WebhookLog;

/// Process-local store. Used when no database is configured, and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    payments: Arc<RwLock<HashMap<String, PaymentLog>>>,
    webhooks: Arc<RwLock<Vec<WebhookLog>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn payment(&self, order_reference: &str) -> Option<PaymentLog> {
        self.payments.read().await.get(order_reference).cloned()
    }

    pub async fn webhook_logs(&self) -> Vec<WebhookLog> {
        self.webhooks.read().await.clone()
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn record_payment(&self, log: PaymentLog) -> Result<()> {
        self.payments
            .write()
            .await
            .insert(log.order_reference.clone(), log);
        Ok(())
    }

    async fn log_webhook(&self, log: WebhookLog) -> Result<()> {
        self.webhooks.write().await.push(log);
        Ok(())
    }

    async fn update_payment_status(&self, update: PaymentStatusUpdate) -> Result<u64> {
        let mut payments = self.payments.write().await;
        let Some(row) = payments.get_mut(&update.order_reference) else {
            return Ok(0);
        };

        // A replayed update older than the last applied one must not win.
        if row
            .webhook_received_at
            .as_deref()
            .is_some_and(|applied| applied > update.webhook_received_at.as_str())
        {
            return Ok(0);
        }

        if let Some(status) = update.status {
            row.status = status;
        }
        if let Some(transaction_id) = update.transaction_id {
            row.transaction_id = Some(transaction_id);
        }
        row.webhook_received_at = Some(update.webhook_received_at);
        row.updated_at = update.updated_at;
        Ok(1)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
