//! Repository for invitations.
//!
//! Only the SHA-256 hash of the invite token is ever stored. Consuming an
//! invite is a single conditional UPDATE so two racing redeemers cannot both
//! succeed.

use amber_ward_access::{Invite, ScopeSet};
use amber_ward_core::{ActorId, ChildId, InviteId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use std::str::FromStr;

use super::decode_error;

#[derive(FromRow)]
struct InviteRow {
    id: String,
    child_id: String,
    recipient_email: String,
    scopes: serde_json::Value,
    token_hash: String,
    sender_id: String,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl InviteRow {
    fn try_into_invite(self) -> Result<Invite, sqlx::Error> {
        let id =
            InviteId::from_str(&self.id).map_err(|e| decode_error("invite id", &self.id, e))?;
        let child_id = ChildId::from_str(&self.child_id)
            .map_err(|e| decode_error("invite child id", &self.child_id, e))?;
        let sender_id = ActorId::from_str(&self.sender_id)
            .map_err(|e| decode_error("invite sender id", &self.sender_id, e))?;
        let scopes: ScopeSet = serde_json::from_value(self.scopes)
            .map_err(|e| decode_error("invite scopes", "jsonb", e))?;

        Ok(Invite {
            id,
            child_id,
            recipient_email: self.recipient_email,
            scopes,
            token_hash: self.token_hash,
            sender_id,
            expires_at: self.expires_at,
            consumed_at: self.consumed_at,
            created_at: self.created_at,
        })
    }
}

/// Repository for invitation operations.
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a new invite.
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        invite: &Invite,
    ) -> Result<(), sqlx::Error> {
        let scopes = serde_json::to_value(&invite.scopes)
            .map_err(|e| decode_error("invite scopes", "jsonb", e))?;

        sqlx::query(
            r#"
            INSERT INTO invites
                (id, child_id, recipient_email, scopes, token_hash, sender_id, expires_at, consumed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8)
            "#,
        )
        .bind(invite.id.to_string())
        .bind(invite.child_id.to_string())
        .bind(&invite.recipient_email)
        .bind(scopes)
        .bind(&invite.token_hash)
        .bind(invite.sender_id.to_string())
        .bind(invite.expires_at)
        .bind(invite.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Atomically consumes the unexpired, unconsumed invite matching the
    /// token hash. Returns `None` when no such invite exists; use
    /// [`find_by_hash`](Self::find_by_hash) to classify the failure.
    pub async fn consume(
        &self,
        conn: &mut PgConnection,
        token_hash: &str,
    ) -> Result<Option<Invite>, sqlx::Error> {
        let row: Option<InviteRow> = sqlx::query_as(
            r#"
            UPDATE invites
            SET consumed_at = NOW()
            WHERE token_hash = $1 AND consumed_at IS NULL AND expires_at > NOW()
            RETURNING id, child_id, recipient_email, scopes, token_hash, sender_id,
                      expires_at, consumed_at, created_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_invite()?)),
            None => Ok(None),
        }
    }

    /// Finds an invite by token hash regardless of state.
    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Invite>, sqlx::Error> {
        let row: Option<InviteRow> = sqlx::query_as(
            r#"
            SELECT id, child_id, recipient_email, scopes, token_hash, sender_id,
                   expires_at, consumed_at, created_at
            FROM invites
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_invite()?)),
            None => Ok(None),
        }
    }

    /// Deletes invites that expired without being consumed, returning the
    /// number removed. Consumed invites are kept for the audit trail.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM invites WHERE consumed_at IS NULL AND expires_at <= NOW()")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
