//! Repository for actor lookups.
//!
//! Actor provisioning (registration, credentials) belongs to the identity
//! surface; this service only reads.

use amber_ward_access::{Actor, Role};
use amber_ward_core::ActorId;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::decode_error;

/// Row type for actor queries.
#[derive(FromRow)]
struct ActorRow {
    id: String,
    role: String,
    email: Option<String>,
    display_name: Option<String>,
}

impl ActorRow {
    fn try_into_actor(self) -> Result<Actor, sqlx::Error> {
        let id = ActorId::from_str(&self.id).map_err(|e| decode_error("actor id", &self.id, e))?;
        let role = Role::from_str(&self.role).map_err(|e| decode_error("role", &self.role, e))?;

        let mut actor = Actor::new(id, role);
        actor.email = self.email;
        actor.display_name = self.display_name;
        Ok(actor)
    }
}

/// Repository for actor operations.
pub struct ActorRepository {
    pool: PgPool,
}

impl ActorRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds an actor by ID.
    pub async fn find_by_id(&self, id: ActorId) -> Result<Option<Actor>, sqlx::Error> {
        let row: Option<ActorRow> = sqlx::query_as(
            r#"
            SELECT id, role, email, display_name
            FROM actors
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_actor()?)),
            None => Ok(None),
        }
    }

    /// Finds an actor by email address.
    ///
    /// Used by the invitation service to short-circuit invites to already
    /// registered professionals.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Actor>, sqlx::Error> {
        let row: Option<ActorRow> = sqlx::query_as(
            r#"
            SELECT id, role, email, display_name
            FROM actors
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_actor()?)),
            None => Ok(None),
        }
    }
}
