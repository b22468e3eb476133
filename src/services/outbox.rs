// services/outbox.rs
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::database::store::PaymentStore;
use crate::errors::Result;
use crate::models::payment::PaymentStatusUpdate;
use crate::models::webhook::WebhookLog;

/// A store write that failed during webhook handling.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistTask {
    LogWebhook(WebhookLog),
    UpdatePayment(PaymentStatusUpdate),
}

impl PersistTask {
    pub fn order_reference(&self) -> &str {
        match self {
            PersistTask::LogWebhook(log) => &log.order_reference,
            PersistTask::UpdatePayment(update) => &update.order_reference,
        }
    }

    pub async fn apply(&self, store: &dyn PaymentStore) -> Result<()> {
        match self {
            PersistTask::LogWebhook(log) => store.log_webhook(log.clone()).await,
            PersistTask::UpdatePayment(update) => {
                let matched = store.update_payment_status(update.clone()).await?;
                if matched == 0 {
                    warn!(
                        "No payment log updated for {} (missing, or a newer webhook already applied)",
                        update.order_reference
                    );
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedTask {
    pub task: PersistTask,
    pub attempt: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub succeeded: usize,
    pub requeued: usize,
    pub dropped: usize,
}

/// In-memory queue of failed webhook writes, retried by [`spawn_outbox_worker`].
#[derive(Debug, Clone)]
pub struct PersistOutbox {
    pending: Arc<RwLock<VecDeque<QueuedTask>>>,
    max_attempts: u32,
    capacity: usize,
}

impl PersistOutbox {
    pub fn new(max_attempts: u32, capacity: usize) -> Self {
        Self {
            pending: Arc::new(RwLock::new(VecDeque::new())),
            max_attempts: max_attempts.max(1),
            capacity: capacity.max(1),
        }
    }

    /// Queues a write whose first attempt already failed. When the queue is
    /// full the oldest write is dropped.
    pub async fn enqueue(&self, task: PersistTask) {
        debug!("Queueing store write for {}", task.order_reference());
        let mut pending = self.pending.write().await;
        pending.push_back(QueuedTask { task, attempt: 1 });
        self.evict_overflow(&mut pending);
    }

    fn evict_overflow(&self, pending: &mut VecDeque<QueuedTask>) {
        while pending.len() > self.capacity {
            if let Some(evicted) = pending.pop_front() {
                error!(
                    "Outbox full ({} writes), dropping store write for {} after {} attempts",
                    self.capacity,
                    evicted.task.order_reference(),
                    evicted.attempt
                );
            }
        }
    }

    pub async fn size(&self) -> usize {
        self.pending.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.read().await.is_empty()
    }

    /// Retries every queued write once. Writes that fail again go back to the
    /// queue until `max_attempts` is reached, then they are dropped.
    pub async fn drain_once(&self, store: &dyn PaymentStore) -> DrainReport {
        let batch: Vec<QueuedTask> = self.pending.write().await.drain(..).collect();
        let mut report = DrainReport::default();
        let mut retry = Vec::new();

        for mut queued in batch {
            match queued.task.apply(store).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    queued.attempt += 1;
                    if queued.attempt >= self.max_attempts {
                        error!(
                            "Dropping store write for {} after {} attempts: {}",
                            queued.task.order_reference(),
                            queued.attempt,
                            e
                        );
                        report.dropped += 1;
                    } else {
                        retry.push(queued);
                        report.requeued += 1;
                    }
                }
            }
        }

        if !retry.is_empty() {
            // Retried writes are older than anything queued during the drain.
            let mut pending = self.pending.write().await;
            for queued in retry.into_iter().rev() {
                pending.push_front(queued);
            }
            self.evict_overflow(&mut pending);
        }

        report
    }
}

pub fn spawn_outbox_worker(
    outbox: PersistOutbox,
    store: Arc<dyn PaymentStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if outbox.is_empty().await {
                continue;
            }

            let report = outbox.drain_once(store.as_ref()).await;
            info!(
                "Outbox drained: {} written, {} requeued, {} dropped",
                report.succeeded, report.requeued, report.dropped
            );
        }
    })
}
