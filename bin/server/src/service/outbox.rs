//! Background delivery of outbox notifications.
//!
//! The worker polls for due messages and hands each to the notifier. A
//! failed delivery is retried with exponential backoff until the message
//! exhausts its attempts and is parked as failed. Delivery failures never
//! propagate to the operation that enqueued the message; it already
//! committed.

use amber_ward_access::Notifier;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::db::{NotificationPayload, OutboxMessage, OutboxRepository};

const BATCH_SIZE: i64 = 20;

/// Polls the notification outbox and delivers due messages.
pub struct OutboxWorker {
    outbox: OutboxRepository,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
    max_attempts: i32,
}

impl OutboxWorker {
    /// Creates a worker over a pool.
    pub fn new(
        pool: PgPool,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
        max_attempts: i32,
    ) -> Self {
        Self {
            outbox: OutboxRepository::new(pool),
            notifier,
            poll_interval,
            max_attempts,
        }
    }

    /// Runs the delivery loop until the task is aborted.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.drain_due().await {
                tracing::error!(%err, "outbox poll failed");
            }
        }
    }

    /// Delivers every message currently due. Returns how many delivered.
    pub async fn drain_due(&self) -> Result<u64, sqlx::Error> {
        let due = self.outbox.fetch_due(BATCH_SIZE, self.max_attempts).await?;
        let mut delivered = 0;

        for message in due {
            if self.deliver(&message).await {
                self.outbox.mark_delivered(message.id).await?;
                delivered += 1;
            } else {
                tracing::warn!(
                    message_id = %message.id,
                    attempts = message.attempts + 1,
                    "notification delivery failed"
                );
                self.outbox
                    .record_failure(
                        message.id,
                        "notifier reported not delivered",
                        self.max_attempts,
                    )
                    .await?;
            }
        }

        Ok(delivered)
    }

    async fn deliver(&self, message: &OutboxMessage) -> bool {
        match &message.payload {
            NotificationPayload::AccessGranted {
                email,
                name,
                sender_name,
                child_name,
                scopes,
            } => {
                self.notifier
                    .send_access_granted(email, name, sender_name, child_name, scopes)
                    .await
            }
            NotificationPayload::AccessRevoked {
                email,
                name,
                child_name,
            } => {
                self.notifier
                    .send_access_revoked(email, name, child_name)
                    .await
            }
            NotificationPayload::RequestDenied {
                email,
                name,
                child_name,
            } => {
                self.notifier
                    .send_request_denied(email, name, child_name)
                    .await
            }
        }
    }
}
