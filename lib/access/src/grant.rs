//! Access grants: the authoritative permission record.
//!
//! At most one grant exists per (child, professional) pair. Revocation is a
//! state change on that row, never a deletion, so the pair's history stays
//! anchored to one identity.

use crate::scope::{Scope, ScopeSet};
use amber_ward_core::{ActorId, ChildId, GrantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted grant of scoped access to one child's record for one
/// professional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Grant ID.
    pub id: GrantId,
    /// The child record this grant covers.
    pub child_id: ChildId,
    /// The professional the grant is for.
    pub professional_id: ActorId,
    /// The scopes the professional may act on.
    pub scopes: ScopeSet,
    /// Whether the grant is currently in force.
    pub active: bool,
    /// The actor who created or last reactivated the grant.
    pub granted_by: ActorId,
    /// When the grant was created or last reactivated.
    pub granted_at: DateTime<Utc>,
    /// When the grant was revoked, if it is not active.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Grant {
    /// Creates a new active grant.
    #[must_use]
    pub fn new(
        child_id: ChildId,
        professional_id: ActorId,
        scopes: ScopeSet,
        granted_by: ActorId,
    ) -> Self {
        Self {
            id: GrantId::new(),
            child_id,
            professional_id,
            scopes,
            active: true,
            granted_by,
            granted_at: Utc::now(),
            revoked_at: None,
        }
    }

    /// Returns true if the grant currently authorizes the given scope.
    #[must_use]
    pub fn authorizes(&self, scope: Scope) -> bool {
        self.active && self.scopes.contains(scope)
    }

    /// Reactivates the grant with a replacement scope set.
    ///
    /// Re-granting replaces the scopes, it does not union them; a caller
    /// that wants additive behavior must read-modify-write explicitly.
    pub fn reactivate(&mut self, scopes: ScopeSet, granted_by: ActorId) {
        self.scopes = scopes;
        self.active = true;
        self.granted_by = granted_by;
        self.granted_at = Utc::now();
        self.revoked_at = None;
    }

    /// Revokes the grant. Idempotent on an already-revoked grant.
    pub fn revoke(&mut self) {
        if self.active {
            self.active = false;
            self.revoked_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grant(scopes: ScopeSet) -> Grant {
        Grant::new(ChildId::new(), ActorId::new(), scopes, ActorId::new())
    }

    #[test]
    fn new_grant_is_active() {
        let grant = sample_grant(ScopeSet::from_scopes([Scope::Messages]));
        assert!(grant.active);
        assert!(grant.revoked_at.is_none());
        assert!(grant.authorizes(Scope::Messages));
        assert!(!grant.authorizes(Scope::MedicalNotes));
    }

    #[test]
    fn revoked_grant_authorizes_nothing() {
        let mut grant = sample_grant(ScopeSet::all());
        grant.revoke();
        assert!(!grant.active);
        assert!(grant.revoked_at.is_some());
        for scope in Scope::ALL {
            assert!(!grant.authorizes(scope));
        }
    }

    #[test]
    fn revoke_is_idempotent() {
        let mut grant = sample_grant(ScopeSet::all());
        grant.revoke();
        let revoked_at = grant.revoked_at;
        grant.revoke();
        assert_eq!(grant.revoked_at, revoked_at);
    }

    #[test]
    fn reactivate_replaces_scopes() {
        let mut grant = sample_grant(ScopeSet::from_scopes([Scope::MedicalNotes]));
        grant.revoke();

        let granted_by = ActorId::new();
        grant.reactivate(ScopeSet::from_scopes([Scope::Messages]), granted_by);

        assert!(grant.active);
        assert!(grant.revoked_at.is_none());
        assert_eq!(grant.granted_by, granted_by);
        // Scopes from the last call only, not the union.
        assert!(grant.authorizes(Scope::Messages));
        assert!(!grant.authorizes(Scope::MedicalNotes));
    }
}
