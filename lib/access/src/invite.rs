//! Invitations for professionals who do not yet hold an account.
//!
//! An invite bootstraps a grant through a single-use, time-limited token
//! delivered by email. Only the token's digest is persisted; redemption
//! recomputes the digest from the presented plaintext and consumes the row
//! atomically at the storage layer.

use crate::actor::Actor;
use crate::scope::ScopeSet;
use crate::token::TokenSecret;
use amber_ward_core::{ActorId, ChildId, InviteId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long an invite token stays redeemable.
pub const INVITE_TTL_DAYS: i64 = 7;

/// A pending or consumed invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Invite ID.
    pub id: InviteId,
    /// The child record the invite covers.
    pub child_id: ChildId,
    /// Where the invitation email was sent.
    pub recipient_email: String,
    /// The scopes the resulting grant will carry.
    pub scopes: ScopeSet,
    /// SHA-256 digest of the token; the plaintext is never persisted.
    pub token_hash: String,
    /// The guardian who sent the invite.
    pub sender_id: ActorId,
    /// When the token stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// When the token was redeemed, if it has been.
    pub consumed_at: Option<DateTime<Utc>>,
    /// When the invite was created.
    pub created_at: DateTime<Utc>,
}

impl Invite {
    /// Issues a new invite, returning it together with the token plaintext.
    ///
    /// The plaintext is handed to the email collaborator exactly once and
    /// then dropped; only the digest lands in the invite.
    #[must_use]
    pub fn issue(
        child_id: ChildId,
        recipient_email: impl Into<String>,
        scopes: ScopeSet,
        sender_id: ActorId,
        ttl: Duration,
    ) -> (Self, TokenSecret) {
        let token = TokenSecret::generate();
        let now = Utc::now();
        let invite = Self {
            id: InviteId::new(),
            child_id,
            recipient_email: recipient_email.into(),
            scopes,
            token_hash: token.digest(),
            sender_id,
            expires_at: now + ttl,
            consumed_at: None,
            created_at: now,
        };
        (invite, token)
    }

    /// Returns true if the token is past its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the token has already been redeemed.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Returns true if `actor` is the professional this invite was sent to.
    ///
    /// Email comparison ignores ASCII case: addresses are stored lowercased
    /// at issuance, but nothing forces an account's email to be.
    #[must_use]
    pub fn is_addressed_to(&self, actor: &Actor) -> bool {
        actor.role.is_professional()
            && actor
                .email
                .as_deref()
                .is_some_and(|email| email.eq_ignore_ascii_case(&self.recipient_email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use crate::token;

    fn issue_sample(ttl: Duration) -> (Invite, TokenSecret) {
        Invite::issue(
            ChildId::new(),
            "new.clinician@example.com",
            ScopeSet::from_scopes([Scope::Messages]),
            ActorId::new(),
            ttl,
        )
    }

    #[test]
    fn issue_stores_only_the_digest() {
        let (invite, token) = issue_sample(Duration::days(INVITE_TTL_DAYS));
        assert_eq!(invite.token_hash, token.digest());
        assert_ne!(invite.token_hash, token.reveal());
    }

    #[test]
    fn digest_of_plaintext_finds_the_invite() {
        let (invite, token) = issue_sample(Duration::days(INVITE_TTL_DAYS));
        // This is the lookup the redemption path performs.
        assert_eq!(token::digest(token.reveal()), invite.token_hash);
    }

    #[test]
    fn fresh_invite_is_redeemable() {
        let (invite, _) = issue_sample(Duration::days(INVITE_TTL_DAYS));
        assert!(!invite.is_expired());
        assert!(!invite.is_consumed());
    }

    #[test]
    fn expiry_is_seven_days_out() {
        let (invite, _) = issue_sample(Duration::days(INVITE_TTL_DAYS));
        let expected = invite.created_at + Duration::days(7);
        assert_eq!(invite.expires_at, expected);
    }

    #[test]
    fn past_ttl_invite_is_expired() {
        let (invite, _) = issue_sample(Duration::seconds(-1));
        assert!(invite.is_expired());
    }

    #[test]
    fn addressing_ignores_email_case() {
        use crate::actor::Role;
        use amber_ward_core::ActorId;

        let (invite, _) = issue_sample(Duration::days(INVITE_TTL_DAYS));

        let recipient = Actor::new(ActorId::new(), Role::Clinician)
            .with_email("New.Clinician@Example.COM");
        assert!(invite.is_addressed_to(&recipient));

        let stranger =
            Actor::new(ActorId::new(), Role::Clinician).with_email("other@example.com");
        assert!(!invite.is_addressed_to(&stranger));

        let guardian = Actor::new(ActorId::new(), Role::Guardian)
            .with_email("new.clinician@example.com");
        assert!(!invite.is_addressed_to(&guardian));

        let no_email = Actor::new(ActorId::new(), Role::Clinician);
        assert!(!invite.is_addressed_to(&no_email));
    }

    #[test]
    fn serialized_invite_never_contains_plaintext() {
        let (invite, token) = issue_sample(Duration::days(INVITE_TTL_DAYS));
        let json = serde_json::to_string(&invite).expect("serialize");
        assert!(!json.contains(token.reveal()));
        assert!(json.contains(&invite.token_hash));
    }
}
