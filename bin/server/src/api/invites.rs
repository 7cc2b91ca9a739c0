//! Handlers for issuing and redeeming invitations.

use amber_ward_access::{Grant, ScopeSet};
use amber_ward_core::ChildId;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::api::extract::{ClientInfo, CurrentActor};
use crate::error::ApiError;
use crate::service::InviteOutcome;

#[derive(Deserialize)]
pub struct SendInviteBody {
    pub recipient_email: String,
    pub scopes: ScopeSet,
}

/// `POST /children/{child_id}/invite`
///
/// The response never carries the token; it travels only in the email.
pub async fn send(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ClientInfo(meta): ClientInfo,
    Path(child_id): Path<ChildId>,
    Json(body): Json<SendInviteBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let outcome = state
        .invites
        .send_invite(&actor, child_id, &body.recipient_email, body.scopes, &meta)
        .await?;

    let response = match outcome {
        InviteOutcome::Invited { invite_id } => serde_json::json!({
            "status": "invited",
            "invite_id": invite_id,
        }),
        InviteOutcome::Granted { grant } => serde_json::json!({
            "status": "granted",
            "grant": grant,
        }),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Deserialize)]
pub struct RedeemBody {
    pub token: String,
}

/// `POST /invites/redeem`
pub async fn redeem(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ClientInfo(meta): ClientInfo,
    Json(body): Json<RedeemBody>,
) -> Result<(StatusCode, Json<Grant>), ApiError> {
    let grant = state.invites.redeem(&actor, &body.token, &meta).await?;
    Ok((StatusCode::CREATED, Json(grant)))
}
