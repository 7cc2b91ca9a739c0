//! Repository for access grants.
//!
//! Writes take a connection so callers can bundle the grant change with its
//! audit entry in one transaction. Reads go through the pool.

use amber_ward_access::{Grant, ScopeSet};
use amber_ward_core::{ActorId, ChildId, GrantId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use std::str::FromStr;

use super::decode_error;

#[derive(FromRow)]
struct GrantRow {
    id: String,
    child_id: String,
    professional_id: String,
    scopes: serde_json::Value,
    active: bool,
    granted_by: String,
    granted_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl GrantRow {
    fn try_into_grant(self) -> Result<Grant, sqlx::Error> {
        let id = GrantId::from_str(&self.id).map_err(|e| decode_error("grant id", &self.id, e))?;
        let child_id = ChildId::from_str(&self.child_id)
            .map_err(|e| decode_error("grant child id", &self.child_id, e))?;
        let professional_id = ActorId::from_str(&self.professional_id)
            .map_err(|e| decode_error("grant professional id", &self.professional_id, e))?;
        let granted_by = ActorId::from_str(&self.granted_by)
            .map_err(|e| decode_error("grant granted_by", &self.granted_by, e))?;
        let scopes: ScopeSet = serde_json::from_value(self.scopes)
            .map_err(|e| decode_error("grant scopes", "jsonb", e))?;

        Ok(Grant {
            id,
            child_id,
            professional_id,
            scopes,
            active: self.active,
            granted_by,
            granted_at: self.granted_at,
            revoked_at: self.revoked_at,
        })
    }
}

/// Repository for grant operations.
pub struct GrantRepository {
    pool: PgPool,
}

impl GrantRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a grant, or replaces the scopes of the existing grant for the
    /// same (child, professional) pair and reactivates it.
    ///
    /// Returns the stored grant, which keeps the original row's ID when the
    /// pair already existed.
    pub async fn upsert(
        &self,
        conn: &mut PgConnection,
        grant: &Grant,
    ) -> Result<Grant, sqlx::Error> {
        let scopes = serde_json::to_value(&grant.scopes)
            .map_err(|e| decode_error("grant scopes", "jsonb", e))?;

        let row: GrantRow = sqlx::query_as(
            r#"
            INSERT INTO grants (id, child_id, professional_id, scopes, active, granted_by, granted_at, revoked_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $6, NULL)
            ON CONFLICT (child_id, professional_id) DO UPDATE SET
                scopes = EXCLUDED.scopes,
                active = TRUE,
                granted_by = EXCLUDED.granted_by,
                granted_at = EXCLUDED.granted_at,
                revoked_at = NULL
            RETURNING id, child_id, professional_id, scopes, active, granted_by, granted_at, revoked_at
            "#,
        )
        .bind(grant.id.to_string())
        .bind(grant.child_id.to_string())
        .bind(grant.professional_id.to_string())
        .bind(scopes)
        .bind(grant.granted_by.to_string())
        .bind(grant.granted_at)
        .fetch_one(&mut *conn)
        .await?;

        row.try_into_grant()
    }

    /// Deactivates the active grant for the pair, stamping the revocation
    /// time. Returns `None` when no active grant exists, which includes the
    /// already-revoked case.
    pub async fn revoke(
        &self,
        conn: &mut PgConnection,
        child_id: ChildId,
        professional_id: ActorId,
    ) -> Result<Option<Grant>, sqlx::Error> {
        let row: Option<GrantRow> = sqlx::query_as(
            r#"
            UPDATE grants
            SET active = FALSE, revoked_at = NOW()
            WHERE child_id = $1 AND professional_id = $2 AND active
            RETURNING id, child_id, professional_id, scopes, active, granted_by, granted_at, revoked_at
            "#,
        )
        .bind(child_id.to_string())
        .bind(professional_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_grant()?)),
            None => Ok(None),
        }
    }

    /// Finds the grant for a (child, professional) pair, active or not.
    pub async fn find_by_pair(
        &self,
        child_id: ChildId,
        professional_id: ActorId,
    ) -> Result<Option<Grant>, sqlx::Error> {
        let row: Option<GrantRow> = sqlx::query_as(
            r#"
            SELECT id, child_id, professional_id, scopes, active, granted_by, granted_at, revoked_at
            FROM grants
            WHERE child_id = $1 AND professional_id = $2
            "#,
        )
        .bind(child_id.to_string())
        .bind(professional_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_grant()?)),
            None => Ok(None),
        }
    }

    /// Lists the active grants for a child, newest first.
    pub async fn list_active_for_child(
        &self,
        child_id: ChildId,
    ) -> Result<Vec<Grant>, sqlx::Error> {
        let rows: Vec<GrantRow> = sqlx::query_as(
            r#"
            SELECT id, child_id, professional_id, scopes, active, granted_by, granted_at, revoked_at
            FROM grants
            WHERE child_id = $1 AND active
            ORDER BY granted_at DESC
            "#,
        )
        .bind(child_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GrantRow::try_into_grant).collect()
    }
}
