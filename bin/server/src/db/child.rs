//! Repository for child records.

use amber_ward_access::ChildRecord;
use amber_ward_core::{ActorId, ChildId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::decode_error;

/// Row type for child queries.
#[derive(FromRow)]
struct ChildRow {
    id: String,
    guardian_id: String,
    name: String,
    date_of_birth: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChildRow {
    fn try_into_record(self) -> Result<ChildRecord, sqlx::Error> {
        let id = ChildId::from_str(&self.id).map_err(|e| decode_error("child id", &self.id, e))?;
        let guardian_id = ActorId::from_str(&self.guardian_id)
            .map_err(|e| decode_error("guardian id", &self.guardian_id, e))?;

        Ok(ChildRecord {
            id,
            guardian_id,
            name: self.name,
            date_of_birth: self.date_of_birth,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for child record operations.
pub struct ChildRepository {
    pool: PgPool,
}

impl ChildRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a child record by ID.
    pub async fn find_by_id(&self, id: ChildId) -> Result<Option<ChildRecord>, sqlx::Error> {
        let row: Option<ChildRow> = sqlx::query_as(
            r#"
            SELECT id, guardian_id, name, date_of_birth, created_at, updated_at
            FROM children
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_record()?)),
            None => Ok(None),
        }
    }
}
