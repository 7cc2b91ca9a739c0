//! Handlers for the access request workflow.

use amber_ward_access::{AccessRequest, ScopeSet};
use amber_ward_core::{AccessRequestId, ChildId};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::api::extract::{ClientInfo, CurrentActor};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateRequestBody {
    pub child_id: ChildId,
    pub scopes: ScopeSet,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /access-requests`
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ClientInfo(meta): ClientInfo,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<AccessRequest>), ApiError> {
    let request = state
        .requests
        .create(&actor, body.child_id, body.scopes, body.message, &meta)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Deny,
}

#[derive(Deserialize)]
pub struct DecideBody {
    pub action: Decision,
    /// Scopes to grant on approval; defaults to the requested set. Ignored
    /// on denial.
    #[serde(default)]
    pub scopes: Option<ScopeSet>,
}

/// `PATCH /access-requests/{id}`
///
/// Guardian decision on a pending request. Approval answers with the
/// resulting grant; denial with the decided request.
pub async fn decide(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ClientInfo(meta): ClientInfo,
    Path(id): Path<AccessRequestId>,
    Json(body): Json<DecideBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match body.action {
        Decision::Approve => {
            let grant = state.requests.approve(&actor, id, body.scopes, &meta).await?;
            Ok(Json(serde_json::json!({
                "status": "approved",
                "grant": grant,
            })))
        }
        Decision::Deny => {
            let request = state.requests.deny(&actor, id, &meta).await?;
            Ok(Json(serde_json::json!({
                "status": "denied",
                "request": request,
            })))
        }
    }
}

/// `DELETE /access-requests/{id}`
///
/// Withdraws the caller's own pending request.
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ClientInfo(meta): ClientInfo,
    Path(id): Path<AccessRequestId>,
) -> Result<StatusCode, ApiError> {
    state.requests.withdraw(&actor, id, &meta).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /children/{child_id}/access-requests`
///
/// Pending requests on a child's record, for the guardian.
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(child_id): Path<ChildId>,
) -> Result<Json<Vec<AccessRequest>>, ApiError> {
    let requests = state.requests.list_pending(&actor, child_id).await?;
    Ok(Json(requests))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parses_snake_case() {
        let body: DecideBody = serde_json::from_str(r#"{"action":"approve"}"#).unwrap();
        assert!(matches!(body.action, Decision::Approve));

        let body: DecideBody = serde_json::from_str(r#"{"action":"deny"}"#).unwrap();
        assert!(matches!(body.action, Decision::Deny));

        assert!(serde_json::from_str::<DecideBody>(r#"{"action":"escalate"}"#).is_err());
    }

    #[test]
    fn create_body_message_is_optional() {
        let json = format!(
            r#"{{"child_id":"{}","scopes":["messages"]}}"#,
            ChildId::new()
        );
        let body: CreateRequestBody = serde_json::from_str(&json).unwrap();
        assert!(body.message.is_none());
        assert_eq!(body.scopes.len(), 1);
    }
}
