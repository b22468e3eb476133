use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    Collection, Database,
};
use tracing::debug;

use crate::database::store::PaymentStore;
use crate::errors::Result;
use crate::models::payment::{PaymentLog, PaymentStatusUpdate};
use crate::models::webhook::WebhookLog;

pub const WEBHOOKS_COLLECTION: &str = "clickpesa_webhooks";
pub const PAYMENTS_COLLECTION: &str = "payment_logs";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn webhooks(&self) -> Collection<WebhookLog> {
        self.db.collection(WEBHOOKS_COLLECTION)
    }

    fn payments(&self) -> Collection<PaymentLog> {
        self.db.collection(PAYMENTS_COLLECTION)
    }
}

fn status_update_doc(update: &PaymentStatusUpdate) -> Document {
    let mut set = doc! {
        "webhook_received_at": update.webhook_received_at.as_str(),
        "updated_at": update.updated_at.as_str(),
    };
    if let Some(status) = &update.status {
        set.insert("status", status.as_str());
    }
    if let Some(transaction_id) = &update.transaction_id {
        set.insert("transaction_id", transaction_id.as_str());
    }
    doc! { "$set": set }
}

/// Matches the row unless a webhook received later has already been applied.
fn status_update_filter(update: &PaymentStatusUpdate) -> Document {
    doc! {
        "order_reference": update.order_reference.as_str(),
        "$or": [
            { "webhook_received_at": null },
            { "webhook_received_at": { "$lte": update.webhook_received_at.as_str() } },
        ],
    }
}

#[async_trait]
impl PaymentStore for MongoStore {
    async fn record_payment(&self, log: PaymentLog) -> Result<()> {
        let result = self.payments().insert_one(log).await?;
        debug!("Payment log inserted: {:?}", result.inserted_id);
        Ok(())
    }

    async fn log_webhook(&self, log: WebhookLog) -> Result<()> {
        let result = self.webhooks().insert_one(log).await?;
        debug!("Webhook logged: {:?}", result.inserted_id);
        Ok(())
    }

    async fn update_payment_status(&self, update: PaymentStatusUpdate) -> Result<u64> {
        let result = self
            .payments()
            .update_one(status_update_filter(&update), status_update_doc(&update))
            .await?;
        Ok(result.matched_count)
    }

    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
