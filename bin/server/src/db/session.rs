//! Repository for server-side sessions.
//!
//! Sessions are issued elsewhere; this crate only resolves them to actors
//! and sweeps out expired rows.

use amber_ward_core::ActorId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::decode_error;

/// A server-side session bound to an actor.
pub struct SessionRecord {
    pub id: String,
    pub actor_id: ActorId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Returns `true` when the session is past its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: String,
    actor_id: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_record(self) -> Result<SessionRecord, sqlx::Error> {
        let actor_id = ActorId::from_str(&self.actor_id)
            .map_err(|e| decode_error("session actor id", &self.actor_id, e))?;

        Ok(SessionRecord {
            id: self.id,
            actor_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

/// Repository for session operations.
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a session by its opaque identifier.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<SessionRecord>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, actor_id, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_record()?)),
            None => Ok(None),
        }
    }

    /// Deletes all expired sessions, returning the number removed.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
