//! The authorization guard: the single decision point for protected content.
//!
//! `decide` is a pure function over the actor, the child record, and the
//! grant row (if any) for the pair. Every reader or writer of protected
//! content -- notes, messages, video-room tokens -- must consult it before
//! touching that content. The server composes it with the grant store; see
//! the access service in the server crate.

use crate::actor::Actor;
use crate::child::ChildRecord;
use crate::grant::Grant;
use crate::scope::Scope;
use serde::{Deserialize, Serialize};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// The actor may act on the scope.
    Allow,
    /// The actor may not act on the scope.
    Deny,
}

impl AccessDecision {
    /// Returns true for `Allow`.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether `actor` may act on `scope` of `child`'s record.
///
/// The guardian of record is always allowed, with no grant row involved.
/// Everyone else -- clinicians, support staff, and admins alike -- needs an
/// active grant for the pair that contains the scope. Admin gets no bypass;
/// that is a deliberate least-privilege rule, not an omission.
///
/// `grant` must be the grant row for (child, actor), or `None` when no such
/// row exists; a grant for a different pair is ignored.
#[must_use]
pub fn decide(
    actor: &Actor,
    child: &ChildRecord,
    grant: Option<&Grant>,
    scope: Scope,
) -> AccessDecision {
    if child.is_guardian(actor.id) {
        return AccessDecision::Allow;
    }

    match grant {
        Some(grant)
            if grant.child_id == child.id
                && grant.professional_id == actor.id
                && grant.authorizes(scope) =>
        {
            AccessDecision::Allow
        }
        _ => AccessDecision::Deny,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Role;
    use crate::scope::ScopeSet;
    use amber_ward_core::ActorId;

    fn child_with_guardian() -> (ChildRecord, Actor) {
        let guardian = Actor::new(ActorId::new(), Role::Guardian);
        let child = ChildRecord::new(guardian.id, "Sam");
        (child, guardian)
    }

    fn grant_for(child: &ChildRecord, actor: &Actor, scopes: ScopeSet) -> Grant {
        Grant::new(child.id, actor.id, scopes, child.guardian_id)
    }

    #[test]
    fn guardian_always_allowed_without_grant() {
        let (child, guardian) = child_with_guardian();
        for scope in Scope::ALL {
            assert_eq!(decide(&guardian, &child, None, scope), AccessDecision::Allow);
        }
    }

    #[test]
    fn professional_allowed_within_granted_scopes() {
        let (child, _) = child_with_guardian();
        let clinician = Actor::new(ActorId::new(), Role::Clinician);
        let grant = grant_for(&child, &clinician, ScopeSet::from_scopes([Scope::MedicalNotes]));

        assert_eq!(
            decide(&clinician, &child, Some(&grant), Scope::MedicalNotes),
            AccessDecision::Allow
        );
        assert_eq!(
            decide(&clinician, &child, Some(&grant), Scope::Messages),
            AccessDecision::Deny
        );
    }

    #[test]
    fn professional_denied_without_grant() {
        let (child, _) = child_with_guardian();
        let clinician = Actor::new(ActorId::new(), Role::Clinician);
        assert_eq!(
            decide(&clinician, &child, None, Scope::MedicalNotes),
            AccessDecision::Deny
        );
    }

    #[test]
    fn admin_never_implicit() {
        let (child, _) = child_with_guardian();
        let admin = Actor::new(ActorId::new(), Role::Admin);
        for scope in Scope::ALL {
            assert_eq!(decide(&admin, &child, None, scope), AccessDecision::Deny);
        }
    }

    #[test]
    fn admin_allowed_with_explicit_grant() {
        let (child, _) = child_with_guardian();
        let admin = Actor::new(ActorId::new(), Role::Admin);
        let grant = grant_for(&child, &admin, ScopeSet::from_scopes([Scope::Messages]));
        assert_eq!(
            decide(&admin, &child, Some(&grant), Scope::Messages),
            AccessDecision::Allow
        );
    }

    #[test]
    fn revoked_grant_denies_every_scope() {
        let (child, _) = child_with_guardian();
        let clinician = Actor::new(ActorId::new(), Role::Clinician);
        let mut grant = grant_for(&child, &clinician, ScopeSet::all());
        grant.revoke();

        for scope in Scope::ALL {
            assert_eq!(
                decide(&clinician, &child, Some(&grant), scope),
                AccessDecision::Deny
            );
        }
    }

    #[test]
    fn grant_for_other_pair_is_ignored() {
        let (child, _) = child_with_guardian();
        let (other_child, _) = child_with_guardian();
        let clinician = Actor::new(ActorId::new(), Role::Clinician);
        let grant = grant_for(&other_child, &clinician, ScopeSet::all());

        assert_eq!(
            decide(&clinician, &child, Some(&grant), Scope::MedicalNotes),
            AccessDecision::Deny
        );
    }

    #[test]
    fn minor_denied_without_grant() {
        let (child, _) = child_with_guardian();
        let minor = Actor::new(ActorId::new(), Role::Minor);
        assert_eq!(
            decide(&minor, &child, None, Scope::Messages),
            AccessDecision::Deny
        );
    }
}
