//! Handlers for grants: listing, revocation, access checks, and the child
//! audit view.

use amber_ward_access::{AccessDecision, Grant, Scope};
use amber_ward_audit::{AuditAction, AuditEntry, Page};
use amber_ward_core::{ActorId, ChildId};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::api::extract::{ClientInfo, CurrentActor};
use crate::error::ApiError;

/// `GET /children/{child_id}/access`
///
/// Active grants on the child's record, for the guardian.
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(child_id): Path<ChildId>,
) -> Result<Json<Vec<Grant>>, ApiError> {
    let grants = state.access.list_access(&actor, child_id).await?;
    Ok(Json(grants))
}

/// `DELETE /children/{child_id}/access/{professional_id}`
pub async fn revoke(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ClientInfo(meta): ClientInfo,
    Path((child_id, professional_id)): Path<(ChildId, ActorId)>,
) -> Result<Json<Grant>, ApiError> {
    let grant = state
        .access
        .revoke(&actor, child_id, professional_id, &meta)
        .await?;
    Ok(Json(grant))
}

#[derive(Deserialize)]
pub struct CheckQuery {
    pub scope: Scope,
}

/// `GET /children/{child_id}/access/check?scope=...`
///
/// The guard endpoint content surfaces consult before serving protected
/// material. An allowed check is recorded as a `RECORD_VIEWED` entry.
pub async fn check(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ClientInfo(meta): ClientInfo,
    Path(child_id): Path<ChildId>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let decision = state
        .access
        .record_view(&actor, child_id, query.scope, &meta)
        .await?;
    Ok(Json(serde_json::json!({
        "decision": decision,
        "allowed": decision == AccessDecision::Allow,
    })))
}

#[derive(Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub action: Option<AuditAction>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// `GET /children/{child_id}/audit`
///
/// The child's audit trail, newest first, for the guardian.
pub async fn audit(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(child_id): Path<ChildId>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let page = Page::new(
        query.limit.unwrap_or(Page::DEFAULT_LIMIT),
        query.offset.unwrap_or(0),
    );
    let entries = state
        .access
        .audit_for_child(&actor, child_id, query.action, page)
        .await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_query_parses_scope() {
        let query: CheckQuery = serde_json::from_str(r#"{"scope":"medical_notes"}"#).unwrap();
        assert_eq!(query.scope, Scope::MedicalNotes);
    }

    #[test]
    fn audit_query_defaults_are_open() {
        let query: AuditQuery = serde_json::from_str("{}").unwrap();
        assert!(query.action.is_none());
        assert!(query.limit.is_none());
    }
}
