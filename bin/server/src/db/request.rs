//! Repository for access requests.
//!
//! The one-pending-per-pair rule is enforced by a partial unique index on
//! (child_id, professional_id) WHERE status = 'pending'; callers surface the
//! unique violation as a conflict. Transitions are conditional updates keyed
//! on the pending status so only one decision wins.

use amber_ward_access::{AccessRequest, RequestStatus, ScopeSet};
use amber_ward_core::{AccessRequestId, ActorId, ChildId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use std::str::FromStr;

use super::decode_error;

#[derive(FromRow)]
struct RequestRow {
    id: String,
    child_id: String,
    professional_id: String,
    requested_scopes: serde_json::Value,
    status: String,
    message: Option<String>,
    responded_by: Option<String>,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl RequestRow {
    fn try_into_request(self) -> Result<AccessRequest, sqlx::Error> {
        let id = AccessRequestId::from_str(&self.id)
            .map_err(|e| decode_error("request id", &self.id, e))?;
        let child_id = ChildId::from_str(&self.child_id)
            .map_err(|e| decode_error("request child id", &self.child_id, e))?;
        let professional_id = ActorId::from_str(&self.professional_id)
            .map_err(|e| decode_error("request professional id", &self.professional_id, e))?;
        let status = RequestStatus::from_str(&self.status)
            .map_err(|e| decode_error("request status", &self.status, e))?;
        let responded_by = match &self.responded_by {
            Some(s) => {
                Some(ActorId::from_str(s).map_err(|e| decode_error("request responded_by", s, e))?)
            }
            None => None,
        };
        let requested_scopes: ScopeSet = serde_json::from_value(self.requested_scopes)
            .map_err(|e| decode_error("request scopes", "jsonb", e))?;

        Ok(AccessRequest {
            id,
            child_id,
            professional_id,
            requested_scopes,
            message: self.message,
            status,
            created_at: self.created_at,
            responded_at: self.responded_at,
            responded_by,
        })
    }
}

/// Repository for access request operations.
pub struct AccessRequestRepository {
    pool: PgPool,
}

impl AccessRequestRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a new pending request. Fails with a unique violation when a
    /// pending request for the pair already exists.
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        request: &AccessRequest,
    ) -> Result<(), sqlx::Error> {
        let scopes = serde_json::to_value(&request.requested_scopes)
            .map_err(|e| decode_error("request scopes", "jsonb", e))?;

        sqlx::query(
            r#"
            INSERT INTO access_requests
                (id, child_id, professional_id, requested_scopes, message, status, created_at, responded_at, responded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, NULL)
            "#,
        )
        .bind(request.id.to_string())
        .bind(request.child_id.to_string())
        .bind(request.professional_id.to_string())
        .bind(scopes)
        .bind(&request.message)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Finds a request by ID.
    pub async fn find_by_id(
        &self,
        id: AccessRequestId,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        let row: Option<RequestRow> = sqlx::query_as(
            r#"
            SELECT id, child_id, professional_id, requested_scopes, message, status,
                   created_at, responded_at, responded_by
            FROM access_requests
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_request()?)),
            None => Ok(None),
        }
    }

    /// Moves a pending request to a terminal status, stamping who decided and
    /// when. Returns `None` when the request is missing or no longer pending.
    pub async fn transition(
        &self,
        conn: &mut PgConnection,
        id: AccessRequestId,
        to: RequestStatus,
        responded_by: ActorId,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        let row: Option<RequestRow> = sqlx::query_as(
            r#"
            UPDATE access_requests
            SET status = $2, responded_by = $3, responded_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, child_id, professional_id, requested_scopes, message, status,
                      created_at, responded_at, responded_by
            "#,
        )
        .bind(id.to_string())
        .bind(to.as_str())
        .bind(responded_by.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_request()?)),
            None => Ok(None),
        }
    }

    /// Deletes a pending request owned by the given professional. Returns the
    /// number of rows removed; zero means it was missing, decided, or owned
    /// by someone else.
    pub async fn delete_pending(
        &self,
        conn: &mut PgConnection,
        id: AccessRequestId,
        professional_id: ActorId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM access_requests
            WHERE id = $1 AND professional_id = $2 AND status = 'pending'
            "#,
        )
        .bind(id.to_string())
        .bind(professional_id.to_string())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists pending requests for a child, oldest first.
    pub async fn list_pending_for_child(
        &self,
        child_id: ChildId,
    ) -> Result<Vec<AccessRequest>, sqlx::Error> {
        let rows: Vec<RequestRow> = sqlx::query_as(
            r#"
            SELECT id, child_id, professional_id, requested_scopes, message, status,
                   created_at, responded_at, responded_by
            FROM access_requests
            WHERE child_id = $1 AND status = 'pending'
            ORDER BY created_at ASC
            "#,
        )
        .bind(child_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RequestRow::try_into_request).collect()
    }
}
