//! Repository for the audit ledger.
//!
//! The ledger is append-only: there is no update or delete here, and the
//! append takes a connection so it lands in the same transaction as the
//! state change it records.

use amber_ward_audit::{AuditAction, AuditEntry, AuditFilter, Page, TargetType};
use amber_ward_core::{ActorId, AuditEntryId, ChildId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use std::str::FromStr;

use super::decode_error;

#[derive(FromRow)]
struct AuditRow {
    id: String,
    actor_id: String,
    action: String,
    target_type: String,
    target_id: String,
    child_id: Option<String>,
    metadata: serde_json::Value,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditRow {
    fn try_into_entry(self) -> Result<AuditEntry, sqlx::Error> {
        let id =
            AuditEntryId::from_str(&self.id).map_err(|e| decode_error("audit id", &self.id, e))?;
        let actor_id = ActorId::from_str(&self.actor_id)
            .map_err(|e| decode_error("audit actor id", &self.actor_id, e))?;
        let action = AuditAction::from_str(&self.action)
            .map_err(|e| decode_error("audit action", &self.action, e))?;
        let target_type = TargetType::from_str(&self.target_type)
            .map_err(|e| decode_error("audit target type", &self.target_type, e))?;
        let child_id = match &self.child_id {
            Some(s) => {
                Some(ChildId::from_str(s).map_err(|e| decode_error("audit child id", s, e))?)
            }
            None => None,
        };

        Ok(AuditEntry {
            id,
            actor_id,
            action,
            target_type,
            target_id: self.target_id,
            child_id,
            metadata: self.metadata,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        })
    }
}

/// Repository for audit ledger operations.
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an entry to the ledger.
    pub async fn append(
        &self,
        conn: &mut PgConnection,
        entry: &AuditEntry,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_entries
                (id, actor_id, action, target_type, target_id, child_id, metadata,
                 ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.actor_id.to_string())
        .bind(entry.action.as_str())
        .bind(entry.target_type.as_str())
        .bind(&entry.target_id)
        .bind(entry.child_id.map(|c| c.to_string()))
        .bind(&entry.metadata)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Lists entries matching the filter, newest first.
    pub async fn list(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, actor_id, action, target_type, target_id, child_id, metadata, \
             ip_address, user_agent, created_at FROM audit_entries WHERE 1 = 1",
        );

        if let Some(actor_id) = filter.actor_id {
            builder.push(" AND actor_id = ");
            builder.push_bind(actor_id.to_string());
        }
        if let Some(action) = filter.action {
            builder.push(" AND action = ");
            builder.push_bind(action.as_str());
        }
        if let Some(target_type) = filter.target_type {
            builder.push(" AND target_type = ");
            builder.push_bind(target_type.as_str());
        }
        if let Some(target_id) = &filter.target_id {
            builder.push(" AND target_id = ");
            builder.push_bind(target_id.clone());
        }
        if let Some(child_id) = filter.child_id {
            builder.push(" AND child_id = ");
            builder.push_bind(child_id.to_string());
        }
        if let Some(since) = filter.since {
            builder.push(" AND created_at >= ");
            builder.push_bind(since);
        }
        if let Some(until) = filter.until {
            builder.push(" AND created_at < ");
            builder.push_bind(until);
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(page.limit);
        builder.push(" OFFSET ");
        builder.push_bind(page.offset);

        let rows: Vec<AuditRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(AuditRow::try_into_entry).collect()
    }
}
