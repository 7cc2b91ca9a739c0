//! Invitation issue and redemption.
//!
//! Issue persists only the token digest and hands the plaintext to the
//! mailer once, after commit. Redemption consumes the invite row atomically
//! so a token can never convert into two grants.

use amber_ward_access::{
    AccessError, Actor, Grant, Invite, Notifier, ScopeSet, TokenSecret, token,
};
use amber_ward_audit::{AuditAction, AuditEntry, TargetType};
use amber_ward_core::{ChildId, InviteId};
use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;

use crate::db::{
    ActorRepository, AuditRepository, ChildRepository, GrantRepository, InviteRepository,
    NotificationPayload, OutboxRepository,
};
use crate::error::ApiError;
use crate::service::{ClientMeta, record_grant};

/// Result of sending an invitation.
pub enum InviteOutcome {
    /// The recipient had no account; an invite email is on its way.
    Invited { invite_id: InviteId },
    /// The recipient was already a registered professional, so the grant
    /// was created directly and no token was issued.
    Granted { grant: Grant },
}

/// Operations for inviting professionals into a child's care circle.
pub struct InviteService {
    pool: PgPool,
    actors: ActorRepository,
    children: ChildRepository,
    grants: GrantRepository,
    invites: InviteRepository,
    audit: AuditRepository,
    outbox: OutboxRepository,
    notifier: Arc<dyn Notifier>,
    ttl: Duration,
}

impl InviteService {
    /// Creates the service over a pool.
    pub fn new(pool: PgPool, notifier: Arc<dyn Notifier>, ttl: Duration) -> Self {
        Self {
            actors: ActorRepository::new(pool.clone()),
            children: ChildRepository::new(pool.clone()),
            grants: GrantRepository::new(pool.clone()),
            invites: InviteRepository::new(pool.clone()),
            audit: AuditRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
            notifier,
            ttl,
        }
    }

    /// Invites a professional by email to the child's care circle.
    ///
    /// Only the guardian of record may invite. If the address already
    /// belongs to a registered professional, the grant is created directly
    /// instead of issuing a token.
    pub async fn send_invite(
        &self,
        actor: &Actor,
        child_id: ChildId,
        recipient_email: &str,
        scopes: ScopeSet,
        meta: &ClientMeta,
    ) -> Result<InviteOutcome, ApiError> {
        let child = self
            .children
            .find_by_id(child_id)
            .await?
            .ok_or(ApiError::NotFound {
                entity: "child record",
            })?;
        if !child.is_guardian(actor.id) {
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "invite professionals to this child's record",
            }
            .into());
        }

        let recipient_email = recipient_email.trim().to_ascii_lowercase();
        if recipient_email.is_empty() || !recipient_email.contains('@') {
            return Err(AccessError::validation("recipient email is not valid").into());
        }
        if scopes.is_empty() {
            return Err(AccessError::validation("invite scope set is empty").into());
        }

        // A registered professional needs no token: grant directly and tell
        // them through the outbox.
        if let Some(existing) = self.actors.find_by_email(&recipient_email).await? {
            if !existing.role.is_professional() {
                return Err(AccessError::validation(
                    "recipient account exists but is not a professional",
                )
                .into());
            }

            let mut tx = self.pool.begin().await?;
            let grant = record_grant(
                &self.grants,
                &self.audit,
                &mut tx,
                &child,
                existing.id,
                scopes,
                actor.id,
                actor.id,
                meta,
            )
            .await?;
            // The invitation itself is still part of the record, even though
            // no token was issued.
            let entry = AuditEntry::new(
                actor.id,
                AuditAction::InviteSent,
                TargetType::Grant,
                grant.id.to_string(),
            )
            .with_child(child_id)
            .with_metadata(serde_json::json!({
                "recipient_email": recipient_email.as_str(),
                "short_circuit": true,
            }))
            .with_client(meta.ip_address.clone(), meta.user_agent.clone());
            self.audit.append(&mut tx, &entry).await?;

            let payload = NotificationPayload::AccessGranted {
                email: recipient_email,
                name: existing.name_for_display(),
                sender_name: actor.name_for_display(),
                child_name: child.name.clone(),
                scopes: grant.scopes.clone(),
            };
            self.outbox.enqueue(&mut tx, &payload).await?;
            tx.commit().await?;

            return Ok(InviteOutcome::Granted { grant });
        }

        let (invite, secret) = Invite::issue(
            child_id,
            recipient_email.clone(),
            scopes,
            actor.id,
            self.ttl,
        );

        let mut tx = self.pool.begin().await?;
        self.invites.create(&mut tx, &invite).await?;
        let entry = AuditEntry::new(
            actor.id,
            AuditAction::InviteSent,
            TargetType::Invite,
            invite.id.to_string(),
        )
        .with_child(child_id)
        .with_metadata(serde_json::json!({
            "recipient_email": invite.recipient_email,
            "scopes": invite.scopes,
        }))
        .with_client(meta.ip_address.clone(), meta.user_agent.clone());
        self.audit.append(&mut tx, &entry).await?;
        tx.commit().await?;

        // The plaintext must not be persisted, so the invite email cannot go
        // through the outbox. Send it once, after commit, and only log the
        // failure; the guardian can re-invite.
        self.spawn_invite_email(invite.clone(), secret, actor.name_for_display(), child.name);

        Ok(InviteOutcome::Invited {
            invite_id: invite.id,
        })
    }

    fn spawn_invite_email(
        &self,
        invite: Invite,
        secret: TokenSecret,
        sender_name: String,
        child_name: String,
    ) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let delivered = notifier
                .send_invite(
                    &invite.recipient_email,
                    &sender_name,
                    &child_name,
                    &secret,
                    &invite.scopes,
                    invite.expires_at,
                )
                .await;
            if !delivered {
                tracing::warn!(
                    invite_id = %invite.id,
                    recipient = %invite.recipient_email,
                    "invite email was not delivered"
                );
            }
        });
    }

    /// Redeems an invite token, creating the grant for the redeemer.
    ///
    /// The redeemer must be a registered professional whose email matches
    /// the invite recipient. Consumption is atomic: of two concurrent
    /// redemptions of the same token, exactly one succeeds.
    pub async fn redeem(
        &self,
        actor: &Actor,
        token_plaintext: &str,
        meta: &ClientMeta,
    ) -> Result<Grant, ApiError> {
        let hash = token::digest(token_plaintext.trim());

        let Some(invite) = self.invites.find_by_hash(&hash).await? else {
            return Err(ApiError::NotFound { entity: "invite" });
        };

        if !invite.is_addressed_to(actor) {
            self.record_denied_redemption(actor, &invite, meta).await?;
            return Err(AccessError::Forbidden {
                actor_id: actor.id,
                action: "redeem this invite",
            }
            .into());
        }

        let child = self
            .children
            .find_by_id(invite.child_id)
            .await?
            .ok_or(ApiError::NotFound {
                entity: "child record",
            })?;

        let mut tx = self.pool.begin().await?;
        let Some(consumed) = self.invites.consume(&mut tx, &hash).await? else {
            // The conditional update refused; re-read the row so a token
            // consumed since our first lookup is reported as used, not
            // expired.
            let current = self.invites.find_by_hash(&hash).await?;
            return Err(losing_redeem_error(current.as_ref()));
        };

        let grant = record_grant(
            &self.grants,
            &self.audit,
            &mut tx,
            &child,
            actor.id,
            consumed.scopes.clone(),
            consumed.sender_id,
            actor.id,
            meta,
        )
        .await?;
        tx.commit().await?;

        Ok(grant)
    }

    /// Appends an `INVITE_DENIED` entry for a refused redemption attempt.
    /// The token stays live for its rightful recipient.
    async fn record_denied_redemption(
        &self,
        actor: &Actor,
        invite: &Invite,
        meta: &ClientMeta,
    ) -> Result<(), ApiError> {
        let entry = AuditEntry::new(
            actor.id,
            AuditAction::InviteDenied,
            TargetType::Invite,
            invite.id.to_string(),
        )
        .with_child(invite.child_id)
        .with_metadata(serde_json::json!({ "reason": "redeemer is not the invited recipient" }))
        .with_client(meta.ip_address.clone(), meta.user_agent.clone());

        let mut conn = self.pool.acquire().await?;
        self.audit.append(&mut conn, &entry).await?;
        Ok(())
    }

    /// Sweeps expired, unconsumed invites. Run periodically.
    pub async fn cleanup_expired(&self) -> Result<u64, ApiError> {
        Ok(self.invites.delete_expired().await?)
    }
}

/// Maps a refused token consumption to the caller-visible error.
///
/// `current` is the row as re-read after the conditional update failed;
/// `None` means a sweep already deleted it, which only happens past expiry.
fn losing_redeem_error(current: Option<&Invite>) -> ApiError {
    match current {
        Some(row) if row.is_consumed() => ApiError::Conflict {
            details: "invite token was already used".to_string(),
        },
        _ => ApiError::Expired {
            details: "invite token has expired".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amber_ward_access::{INVITE_TTL_DAYS, Scope, ScopeSet};
    use amber_ward_core::ActorId;
    use chrono::Utc;

    fn sample_invite(ttl: Duration) -> Invite {
        let (invite, _) = Invite::issue(
            ChildId::new(),
            "clinician@example.com",
            ScopeSet::from_scopes([Scope::Messages]),
            ActorId::new(),
            ttl,
        );
        invite
    }

    #[test]
    fn consumed_token_beats_expiry_in_failure_classification() {
        // Consumed in the window between lookup and the conditional update.
        let mut invite = sample_invite(Duration::days(INVITE_TTL_DAYS));
        invite.consumed_at = Some(Utc::now());
        assert!(matches!(
            losing_redeem_error(Some(&invite)),
            ApiError::Conflict { .. }
        ));

        // Consumed and since expired still reports the consumption.
        invite.expires_at = Utc::now() - Duration::seconds(1);
        assert!(matches!(
            losing_redeem_error(Some(&invite)),
            ApiError::Conflict { .. }
        ));
    }

    #[test]
    fn expired_or_swept_token_reports_expiry() {
        let invite = sample_invite(Duration::seconds(-1));
        assert!(matches!(
            losing_redeem_error(Some(&invite)),
            ApiError::Expired { .. }
        ));
        assert!(matches!(losing_redeem_error(None), ApiError::Expired { .. }));
    }
}
