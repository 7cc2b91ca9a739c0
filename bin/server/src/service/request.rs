//! The access request workflow: create, approve, deny, withdraw.
//!
//! Decisions race safely: the storage transition is a conditional update
//! keyed on the pending status, so of two concurrent approve/deny calls
//! exactly one wins and the loser gets a conflict.

use amber_ward_access::{
    AccessError, AccessRequest, Actor, ChildRecord, Grant, RequestStatus, ScopeSet,
};
use amber_ward_audit::{AuditAction, AuditEntry, TargetType};
use amber_ward_core::{AccessRequestId, ChildId};
use sqlx::PgPool;

use crate::db::{
    AccessRequestRepository, ActorRepository, AuditRepository, ChildRepository, GrantRepository,
    NotificationPayload, OutboxRepository,
};
use crate::error::ApiError;
use crate::service::{ClientMeta, is_unique_violation, record_grant};

/// Operations on professional-initiated access requests.
pub struct AccessRequestService {
    pool: PgPool,
    actors: ActorRepository,
    children: ChildRepository,
    grants: GrantRepository,
    requests: AccessRequestRepository,
    audit: AuditRepository,
    outbox: OutboxRepository,
}

impl AccessRequestService {
    /// Creates the service over a pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            actors: ActorRepository::new(pool.clone()),
            children: ChildRepository::new(pool.clone()),
            grants: GrantRepository::new(pool.clone()),
            requests: AccessRequestRepository::new(pool.clone()),
            audit: AuditRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
        }
    }

    async fn load_child(&self, child_id: ChildId) -> Result<ChildRecord, ApiError> {
        self.children
            .find_by_id(child_id)
            .await?
            .ok_or(ApiError::NotFound {
                entity: "child record",
            })
    }

    /// Creates a pending request from a professional for a child's record.
    ///
    /// At most one pending request may exist per (child, professional)
    /// pair; a second attempt conflicts.
    pub async fn create(
        &self,
        actor: &Actor,
        child_id: ChildId,
        scopes: ScopeSet,
        message: Option<String>,
        meta: &ClientMeta,
    ) -> Result<AccessRequest, ApiError> {
        if !actor.role.is_professional() {
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "request access to a child's record",
            }
            .into());
        }
        let child = self.load_child(child_id).await?;

        // An existing active grant makes a request pointless; the guardian
        // would be approving access the professional already holds.
        if let Some(grant) = self.grants.find_by_pair(child.id, actor.id).await? {
            if grant.active {
                return Err(ApiError::Conflict {
                    details: "access to this child is already granted".to_string(),
                });
            }
        }

        let request = AccessRequest::new(child.id, actor.id, scopes, message)?;

        let mut tx = self.pool.begin().await?;
        if let Err(err) = self.requests.create(&mut tx, &request).await {
            if is_unique_violation(&err) {
                return Err(ApiError::Conflict {
                    details: "a pending request for this child already exists".to_string(),
                });
            }
            return Err(err.into());
        }

        let entry = AuditEntry::new(
            actor.id,
            AuditAction::AccessRequested,
            TargetType::AccessRequest,
            request.id.to_string(),
        )
        .with_child(child_id)
        .with_metadata(serde_json::json!({
            "scopes": request.requested_scopes,
            "message": request.message,
        }))
        .with_client(meta.ip_address.clone(), meta.user_agent.clone());
        self.audit.append(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(request)
    }

    /// Approves a pending request, creating (or re-scoping) the grant.
    ///
    /// Only the guardian of record may approve. `granted_scopes` lets the
    /// guardian approve a narrower (or different) set than was asked for;
    /// `None` grants the requested scopes. The professional is notified
    /// through the outbox.
    pub async fn approve(
        &self,
        actor: &Actor,
        request_id: AccessRequestId,
        granted_scopes: Option<ScopeSet>,
        meta: &ClientMeta,
    ) -> Result<Grant, ApiError> {
        let (_, child) = self.load_for_decision(actor, request_id).await?;

        let mut tx = self.pool.begin().await?;
        let Some(decided) = self
            .requests
            .transition(&mut tx, request_id, RequestStatus::Approved, actor.id)
            .await?
        else {
            return Err(ApiError::Conflict {
                details: "request is no longer pending".to_string(),
            });
        };

        let scopes = match granted_scopes {
            Some(scopes) if !scopes.is_empty() => scopes,
            _ => decided.requested_scopes.clone(),
        };
        let grant = record_grant(
            &self.grants,
            &self.audit,
            &mut tx,
            &child,
            decided.professional_id,
            scopes,
            actor.id,
            actor.id,
            meta,
        )
        .await?;

        if let Some(professional) = self.actors.find_by_id(decided.professional_id).await? {
            if let Some(email) = professional.email.clone() {
                let payload = NotificationPayload::AccessGranted {
                    email,
                    name: professional.name_for_display(),
                    sender_name: actor.name_for_display(),
                    child_name: child.name.clone(),
                    scopes: grant.scopes.clone(),
                };
                self.outbox.enqueue(&mut tx, &payload).await?;
            }
        }

        tx.commit().await?;
        Ok(grant)
    }

    /// Denies a pending request. Only the guardian of record may deny.
    pub async fn deny(
        &self,
        actor: &Actor,
        request_id: AccessRequestId,
        meta: &ClientMeta,
    ) -> Result<AccessRequest, ApiError> {
        let (_, child) = self.load_for_decision(actor, request_id).await?;

        let mut tx = self.pool.begin().await?;
        let Some(decided) = self
            .requests
            .transition(&mut tx, request_id, RequestStatus::Denied, actor.id)
            .await?
        else {
            return Err(ApiError::Conflict {
                details: "request is no longer pending".to_string(),
            });
        };

        let entry = AuditEntry::new(
            actor.id,
            AuditAction::AccessRequestDenied,
            TargetType::AccessRequest,
            decided.id.to_string(),
        )
        .with_child(child.id)
        .with_metadata(serde_json::json!({
            "professional_id": decided.professional_id.to_string(),
        }))
        .with_client(meta.ip_address.clone(), meta.user_agent.clone());
        self.audit.append(&mut tx, &entry).await?;

        if let Some(professional) = self.actors.find_by_id(decided.professional_id).await? {
            if let Some(email) = professional.email.clone() {
                let payload = NotificationPayload::RequestDenied {
                    email,
                    name: professional.name_for_display(),
                    child_name: child.name.clone(),
                };
                self.outbox.enqueue(&mut tx, &payload).await?;
            }
        }

        tx.commit().await?;
        Ok(decided)
    }

    /// Withdraws the actor's own pending request, deleting it.
    pub async fn withdraw(
        &self,
        actor: &Actor,
        request_id: AccessRequestId,
        meta: &ClientMeta,
    ) -> Result<(), ApiError> {
        let Some(request) = self.requests.find_by_id(request_id).await? else {
            return Err(ApiError::NotFound {
                entity: "access request",
            });
        };
        if request.professional_id != actor.id {
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "withdraw another professional's request",
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;
        let deleted = self
            .requests
            .delete_pending(&mut tx, request_id, actor.id)
            .await?;
        if deleted == 0 {
            return Err(ApiError::Conflict {
                details: "request is no longer pending".to_string(),
            });
        }

        let entry = AuditEntry::new(
            actor.id,
            AuditAction::AccessRequestWithdrawn,
            TargetType::AccessRequest,
            request_id.to_string(),
        )
        .with_child(request.child_id)
        .with_client(meta.ip_address.clone(), meta.user_agent.clone());
        self.audit.append(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Lists pending requests for a child. Guardian only.
    pub async fn list_pending(
        &self,
        actor: &Actor,
        child_id: ChildId,
    ) -> Result<Vec<AccessRequest>, ApiError> {
        let child = self.load_child(child_id).await?;
        if !child.is_guardian(actor.id) {
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "list requests for this child",
            }
            .into());
        }
        Ok(self.requests.list_pending_for_child(child_id).await?)
    }

    /// Loads the request and its child and checks the actor is the guardian
    /// of record.
    async fn load_for_decision(
        &self,
        actor: &Actor,
        request_id: AccessRequestId,
    ) -> Result<(AccessRequest, ChildRecord), ApiError> {
        let Some(request) = self.requests.find_by_id(request_id).await? else {
            return Err(ApiError::NotFound {
                entity: "access request",
            });
        };
        let child = self.load_child(request.child_id).await?;
        if !child.is_guardian(actor.id) {
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "decide access requests for this child",
            }
            .into());
        }
        Ok((request, child))
    }
}
