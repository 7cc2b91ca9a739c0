//! Access requests: professional-initiated asks for a grant.
//!
//! The state machine is Pending -> Approved or Pending -> Denied, both
//! terminal. A pending request may instead be withdrawn by its creator,
//! which deletes it. The storage layer enforces the same transitions with a
//! conditional update so concurrent approvals cannot both win; the methods
//! here carry the identical rules for in-memory use and for tests.

use crate::error::AccessError;
use crate::scope::ScopeSet;
use amber_ward_core::{AccessRequestId, ActorId, ChildId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting a guardian decision.
    Pending,
    /// Approved by the guardian; terminal.
    Approved,
    /// Denied by the guardian; terminal.
    Denied,
}

impl RequestStatus {
    /// Returns the stable wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }

    /// Returns true for terminal states.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Denied)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "denied" => Ok(Self::Denied),
            other => Err(AccessError::validation(format!(
                "unknown request status '{other}'"
            ))),
        }
    }
}

/// A professional's request for access to one child's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Request ID.
    pub id: AccessRequestId,
    /// The child record access is requested to.
    pub child_id: ChildId,
    /// The requesting professional.
    pub professional_id: ActorId,
    /// The scopes being asked for.
    pub requested_scopes: ScopeSet,
    /// Optional message to the guardian.
    pub message: Option<String>,
    /// Current status.
    pub status: RequestStatus,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// When the guardian responded, for terminal states.
    pub responded_at: Option<DateTime<Utc>>,
    /// The guardian who responded, for terminal states.
    pub responded_by: Option<ActorId>,
}

impl AccessRequest {
    /// Creates a new pending request.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the scope set is empty.
    pub fn new(
        child_id: ChildId,
        professional_id: ActorId,
        requested_scopes: ScopeSet,
        message: Option<String>,
    ) -> Result<Self, AccessError> {
        if requested_scopes.is_empty() {
            return Err(AccessError::validation("requested scope set is empty"));
        }
        Ok(Self {
            id: AccessRequestId::new(),
            child_id,
            professional_id,
            requested_scopes,
            message,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
            responded_by: None,
        })
    }

    /// Returns true while the request awaits a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Marks the request approved.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` unless the request is pending.
    pub fn approve(&mut self, guardian_id: ActorId) -> Result<(), AccessError> {
        self.transition(RequestStatus::Approved, guardian_id)
    }

    /// Marks the request denied.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` unless the request is pending.
    pub fn deny(&mut self, guardian_id: ActorId) -> Result<(), AccessError> {
        self.transition(RequestStatus::Denied, guardian_id)
    }

    fn transition(&mut self, to: RequestStatus, responded_by: ActorId) -> Result<(), AccessError> {
        if !self.is_pending() {
            return Err(AccessError::conflict(format!(
                "request {} is already {}",
                self.id, self.status
            )));
        }
        self.status = to;
        self.responded_at = Some(Utc::now());
        self.responded_by = Some(responded_by);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    fn pending_request() -> AccessRequest {
        AccessRequest::new(
            ChildId::new(),
            ActorId::new(),
            ScopeSet::from_scopes([Scope::MedicalNotes, Scope::Messages]),
            Some("Covering for Dr. B this month".to_string()),
        )
        .expect("valid request")
    }

    #[test]
    fn new_request_is_pending() {
        let request = pending_request();
        assert!(request.is_pending());
        assert!(request.responded_at.is_none());
        assert!(request.responded_by.is_none());
    }

    #[test]
    fn empty_scopes_rejected() {
        let result = AccessRequest::new(ChildId::new(), ActorId::new(), ScopeSet::empty(), None);
        assert!(matches!(result, Err(AccessError::Validation { .. })));
    }

    #[test]
    fn approve_from_pending() {
        let mut request = pending_request();
        let guardian = ActorId::new();
        request.approve(guardian).expect("should approve");
        assert_eq!(request.status, RequestStatus::Approved);
        assert_eq!(request.responded_by, Some(guardian));
        assert!(request.responded_at.is_some());
    }

    #[test]
    fn deny_from_pending() {
        let mut request = pending_request();
        let guardian = ActorId::new();
        request.deny(guardian).expect("should deny");
        assert_eq!(request.status, RequestStatus::Denied);
    }

    #[test]
    fn approve_twice_conflicts() {
        let mut request = pending_request();
        request.approve(ActorId::new()).expect("first approval");
        let err = request.approve(ActorId::new()).unwrap_err();
        assert!(matches!(err, AccessError::Conflict { .. }));
    }

    #[test]
    fn deny_after_approve_conflicts() {
        let mut request = pending_request();
        request.approve(ActorId::new()).expect("approval");
        let err = request.deny(ActorId::new()).unwrap_err();
        assert!(matches!(err, AccessError::Conflict { .. }));
        // Terminal state unchanged.
        assert_eq!(request.status, RequestStatus::Approved);
    }

    #[test]
    fn terminal_states() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Denied.is_terminal());
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Denied,
        ] {
            let parsed: RequestStatus = status.as_str().parse().expect("should parse");
            assert_eq!(parsed, status);
        }
    }
}
