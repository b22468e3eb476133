use async_trait::async_trait;

use crate::errors::Result;
use crate::models::payment::{PaymentLog, PaymentStatusUpdate};
use crate::models::webhook::WebhookLog;

/// Persistent store for payment rows and the webhook audit log.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts the row for a freshly initiated payment.
    async fn record_payment(&self, log: PaymentLog) -> Result<()>;

    /// Appends one received webhook to the audit log.
    async fn log_webhook(&self, log: WebhookLog) -> Result<()>;

    /// Applies the update to the row with the same order reference, whatever
    /// its current status. Returns how many rows matched.
    async fn update_payment_status(&self, update: PaymentStatusUpdate) -> Result<u64>;

    /// Connection check.
    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}
