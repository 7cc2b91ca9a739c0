//! Transactional notification outbox.
//!
//! Messages are enqueued in the same transaction as the state change that
//! warrants them, then delivered by a background worker with bounded
//! retries. Invite emails never pass through here because their payload
//! would have to carry the plaintext token.

use amber_ward_access::ScopeSet;
use amber_ward_core::OutboxMessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use std::str::FromStr;

use super::decode_error;

/// Notification to be delivered outside the transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// A professional gained access to a child's record.
    AccessGranted {
        email: String,
        name: String,
        sender_name: String,
        child_name: String,
        scopes: ScopeSet,
    },
    /// A professional's access was revoked.
    AccessRevoked {
        email: String,
        name: String,
        child_name: String,
    },
    /// A professional's access request was denied.
    RequestDenied {
        email: String,
        name: String,
        child_name: String,
    },
}

/// A pending outbox row fetched for delivery.
pub struct OutboxMessage {
    pub id: OutboxMessageId,
    pub payload: NotificationPayload,
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct OutboxRow {
    id: String,
    payload: serde_json::Value,
    attempts: i32,
    next_attempt_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl OutboxRow {
    fn try_into_message(self) -> Result<OutboxMessage, sqlx::Error> {
        let id = OutboxMessageId::from_str(&self.id)
            .map_err(|e| decode_error("outbox id", &self.id, e))?;
        let payload: NotificationPayload = serde_json::from_value(self.payload)
            .map_err(|e| decode_error("outbox payload", "jsonb", e))?;

        Ok(OutboxMessage {
            id,
            payload,
            attempts: self.attempts,
            next_attempt_at: self.next_attempt_at,
            created_at: self.created_at,
        })
    }
}

/// Repository for outbox operations.
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueues a notification inside the caller's transaction.
    pub async fn enqueue(
        &self,
        conn: &mut PgConnection,
        payload: &NotificationPayload,
    ) -> Result<(), sqlx::Error> {
        let body = serde_json::to_value(payload)
            .map_err(|e| decode_error("outbox payload", "jsonb", e))?;

        sqlx::query(
            r#"
            INSERT INTO notification_outbox (id, payload, status, attempts, next_attempt_at)
            VALUES ($1, $2, 'pending', 0, NOW())
            "#,
        )
        .bind(OutboxMessageId::new().to_string())
        .bind(body)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Fetches messages that are due for delivery, oldest first.
    pub async fn fetch_due(
        &self,
        limit: i64,
        max_attempts: i32,
    ) -> Result<Vec<OutboxMessage>, sqlx::Error> {
        let rows: Vec<OutboxRow> = sqlx::query_as(
            r#"
            SELECT id, payload, attempts, next_attempt_at, created_at
            FROM notification_outbox
            WHERE status = 'pending' AND next_attempt_at <= NOW() AND attempts < $2
            ORDER BY next_attempt_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(max_attempts)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OutboxRow::try_into_message).collect()
    }

    /// Marks a message delivered.
    pub async fn mark_delivered(&self, id: OutboxMessageId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = 'delivered', delivered_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a failed attempt with exponential backoff, parking the
    /// message as failed once it exhausts its attempts.
    pub async fn record_failure(
        &self,
        id: OutboxMessageId,
        error: &str,
        max_attempts: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE notification_outbox
            SET attempts = attempts + 1,
                last_error = $2,
                next_attempt_at = NOW() + (INTERVAL '30 seconds' * POWER(2, attempts)),
                status = CASE WHEN attempts + 1 >= $3 THEN 'failed' ELSE 'pending' END
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(error)
        .bind(max_attempts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amber_ward_access::Scope;

    #[test]
    fn payload_round_trips_tagged() {
        let payload = NotificationPayload::AccessRevoked {
            email: "pro@clinic.example".into(),
            name: "Dr. Vega".into(),
            child_name: "Sam".into(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "access_revoked");

        let back: NotificationPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn granted_payload_carries_scopes() {
        let payload = NotificationPayload::AccessGranted {
            email: "pro@clinic.example".into(),
            name: "Dr. Vega".into(),
            sender_name: "Alex".into(),
            child_name: "Sam".into(),
            scopes: ScopeSet::from_scopes(vec![Scope::MedicalNotes]),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "access_granted");
        assert_eq!(value["scopes"][0], "medical_notes");
    }
}
