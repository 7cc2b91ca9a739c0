//! Access checks, grant listing, revocation, and the child audit view.

use amber_ward_access::{AccessDecision, AccessError, Actor, ChildRecord, Grant, Scope, decide};
use amber_ward_audit::{AuditAction, AuditEntry, AuditFilter, Page, TargetType};
use amber_ward_core::{ActorId, ChildId};
use sqlx::PgPool;

use crate::db::{
    ActorRepository, AuditRepository, ChildRepository, GrantRepository, NotificationPayload,
    OutboxRepository,
};
use crate::error::ApiError;
use crate::service::ClientMeta;

/// Operations over existing access: checks, listing, revocation, audit.
pub struct AccessService {
    pool: PgPool,
    actors: ActorRepository,
    children: ChildRepository,
    grants: GrantRepository,
    audit: AuditRepository,
    outbox: OutboxRepository,
}

impl AccessService {
    /// Creates the service over a pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            actors: ActorRepository::new(pool.clone()),
            children: ChildRepository::new(pool.clone()),
            grants: GrantRepository::new(pool.clone()),
            audit: AuditRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
        }
    }

    pub(crate) async fn load_child(&self, child_id: ChildId) -> Result<ChildRecord, ApiError> {
        self.children
            .find_by_id(child_id)
            .await?
            .ok_or(ApiError::NotFound {
                entity: "child record",
            })
    }

    /// Decides whether `actor` may act on `scope` of the child's record.
    ///
    /// Guardianship is implicit; everyone else needs an active grant that
    /// carries the scope. A revoked grant denies on the next check since the
    /// grant row is read fresh every time.
    pub async fn authorize(
        &self,
        actor: &Actor,
        child_id: ChildId,
        scope: Scope,
    ) -> Result<AccessDecision, ApiError> {
        let child = self.load_child(child_id).await?;
        let grant = self.grants.find_by_pair(child.id, actor.id).await?;
        Ok(decide(actor, &child, grant.as_ref(), scope))
    }

    /// Checks access and, when allowed, records a `RECORD_VIEWED` entry.
    /// Content surfaces call this before serving protected material.
    pub async fn record_view(
        &self,
        actor: &Actor,
        child_id: ChildId,
        scope: Scope,
        meta: &ClientMeta,
    ) -> Result<AccessDecision, ApiError> {
        let decision = self.authorize(actor, child_id, scope).await?;
        if decision.is_allowed() {
            let entry = AuditEntry::new(
                actor.id,
                AuditAction::RecordViewed,
                TargetType::ChildRecord,
                child_id.to_string(),
            )
            .with_child(child_id)
            .with_metadata(serde_json::json!({ "scope": scope }))
            .with_client(meta.ip_address.clone(), meta.user_agent.clone());

            let mut conn = self.pool.acquire().await?;
            self.audit.append(&mut conn, &entry).await?;
        }
        Ok(decision)
    }

    /// Revokes the professional's access to the child's record.
    ///
    /// Only the guardian of record may revoke. The grant row stays, marked
    /// inactive, and the professional is notified through the outbox.
    pub async fn revoke(
        &self,
        actor: &Actor,
        child_id: ChildId,
        professional_id: ActorId,
        meta: &ClientMeta,
    ) -> Result<Grant, ApiError> {
        let child = self.load_child(child_id).await?;
        if !child.is_guardian(actor.id) {
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "revoke access to this child's record",
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let Some(grant) = self.grants.revoke(&mut tx, child_id, professional_id).await? else {
            return Err(ApiError::NotFound {
                entity: "active grant",
            });
        };

        let entry = AuditEntry::new(
            actor.id,
            AuditAction::AccessRevoked,
            TargetType::Grant,
            grant.id.to_string(),
        )
        .with_child(child_id)
        .with_metadata(serde_json::json!({
            "professional_id": professional_id.to_string(),
        }))
        .with_client(meta.ip_address.clone(), meta.user_agent.clone());
        self.audit.append(&mut tx, &entry).await?;

        if let Some(professional) = self.actors.find_by_id(professional_id).await? {
            if let Some(email) = professional.email.clone() {
                let payload = NotificationPayload::AccessRevoked {
                    email,
                    name: professional.name_for_display(),
                    child_name: child.name.clone(),
                };
                self.outbox.enqueue(&mut tx, &payload).await?;
            }
        }

        tx.commit().await?;
        Ok(grant)
    }

    /// Lists the active grants on the child's record. Guardian only.
    pub async fn list_access(
        &self,
        actor: &Actor,
        child_id: ChildId,
    ) -> Result<Vec<Grant>, ApiError> {
        let child = self.load_child(child_id).await?;
        if !child.is_guardian(actor.id) {
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "list access to this child's record",
            }
            .into());
        }
        Ok(self.grants.list_active_for_child(child_id).await?)
    }

    /// Returns the child's audit trail, newest first. Guardian only.
    pub async fn audit_for_child(
        &self,
        actor: &Actor,
        child_id: ChildId,
        action: Option<AuditAction>,
        page: Page,
    ) -> Result<Vec<AuditEntry>, ApiError> {
        let child = self.load_child(child_id).await?;
        if !child.is_guardian(actor.id) {
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "view this child's audit trail",
            }
            .into());
        }

        let mut filter = AuditFilter::any().child(child_id);
        if let Some(action) = action {
            filter = filter.action(action);
        }
        Ok(self.audit.list(&filter, page).await?)
    }
}
