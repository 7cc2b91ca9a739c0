//! Error taxonomy for access-control operations.
//!
//! Every failure of a core operation falls into one of these categories and
//! is surfaced to the caller as a typed error; none are silently swallowed.
//! Notifier failures are the one deliberate exception -- they are logged by
//! the delivery worker and never fail the owning operation.

use amber_ward_core::ActorId;
use std::fmt;

/// Errors from access-control operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No actor identity present; always fatal to the request.
    Unauthenticated,
    /// Actor authenticated but lacks the role or ownership required.
    Forbidden {
        actor_id: ActorId,
        action: &'static str,
    },
    /// Target entity does not exist or is not visible to the actor.
    NotFound { entity: &'static str },
    /// The operation conflicts with current state: duplicate pending
    /// request, existing active grant, non-pending request, or a token
    /// that was already consumed.
    Conflict { details: String },
    /// An invite token past its expiry.
    Expired { details: String },
    /// Malformed input: empty scope set, empty recipient, and the like.
    Validation { details: String },
}

impl AccessError {
    /// Conflict with the given detail message.
    #[must_use]
    pub fn conflict(details: impl Into<String>) -> Self {
        Self::Conflict {
            details: details.into(),
        }
    }

    /// Validation failure with the given detail message.
    #[must_use]
    pub fn validation(details: impl Into<String>) -> Self {
        Self::Validation {
            details: details.into(),
        }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "not authenticated"),
            Self::Forbidden { actor_id, action } => {
                write!(f, "actor {actor_id} is not allowed to {action}")
            }
            Self::NotFound { entity } => write!(f, "{entity} not found"),
            Self::Conflict { details } => write!(f, "conflict: {details}"),
            Self::Expired { details } => write!(f, "expired: {details}"),
            Self::Validation { details } => write!(f, "validation failed: {details}"),
        }
    }
}

impl std::error::Error for AccessError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_names_actor_and_action() {
        let actor_id = ActorId::new();
        let err = AccessError::Forbidden {
            actor_id,
            action: "approve access requests",
        };
        let msg = err.to_string();
        assert!(msg.contains(&actor_id.to_string()));
        assert!(msg.contains("approve access requests"));
    }

    #[test]
    fn not_found_names_entity() {
        let err = AccessError::NotFound { entity: "invite" };
        assert_eq!(err.to_string(), "invite not found");
    }

    #[test]
    fn conflict_carries_details() {
        let err = AccessError::conflict("request is no longer pending");
        assert!(err.to_string().contains("request is no longer pending"));
    }

    #[test]
    fn validation_carries_details() {
        let err = AccessError::validation("scope set is empty");
        assert!(err.to_string().contains("scope set is empty"));
    }
}
