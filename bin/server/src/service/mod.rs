//! Service layer composing repositories into transactional operations.
//!
//! Each state change and its audit entry (and any outbox message) commit in
//! one transaction. Repositories stay thin; the rules live here.

pub mod access;
pub mod invite;
pub mod outbox;
pub mod request;

pub use access::AccessService;
pub use invite::{InviteOutcome, InviteService};
pub use outbox::OutboxWorker;
pub use request::AccessRequestService;

use amber_ward_access::{ChildRecord, Grant, ScopeSet};
use amber_ward_audit::{AuditAction, AuditEntry, TargetType};
use amber_ward_core::ActorId;
use sqlx::PgConnection;

use crate::db::{AuditRepository, GrantRepository};

/// Client context captured at the HTTP boundary, attached to audit entries.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    /// Remote IP address as reported by the connection or proxy headers.
    pub ip_address: Option<String>,
    /// The request's User-Agent header.
    pub user_agent: Option<String>,
}

/// Returns true when the error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Upserts a grant for the pair and appends its `ACCESS_GRANTED` entry, both
/// on the caller's transaction. Shared by invite redemption, request
/// approval, and the registered-professional invite short-circuit.
///
/// `granted_by` is the authorizing guardian; `recorded_by` is the actor who
/// performed the operation. They differ on invite redemption, where the
/// professional acts on an authorization the guardian issued earlier.
pub(crate) async fn record_grant(
    grants: &GrantRepository,
    audit: &AuditRepository,
    conn: &mut PgConnection,
    child: &ChildRecord,
    professional_id: ActorId,
    scopes: ScopeSet,
    granted_by: ActorId,
    recorded_by: ActorId,
    meta: &ClientMeta,
) -> Result<Grant, sqlx::Error> {
    let grant = Grant::new(child.id, professional_id, scopes, granted_by);
    let stored = grants.upsert(conn, &grant).await?;

    let entry = AuditEntry::new(
        recorded_by,
        AuditAction::AccessGranted,
        TargetType::Grant,
        stored.id.to_string(),
    )
    .with_child(child.id)
    .with_metadata(serde_json::json!({
        "professional_id": stored.professional_id.to_string(),
        "scopes": stored.scopes,
    }))
    .with_client(meta.ip_address.clone(), meta.user_agent.clone());
    audit.append(conn, &entry).await?;

    Ok(stored)
}
