//! Audit ledger entries.
//!
//! Entries are append-only: nothing in the public contract updates or
//! deletes one after it is written. Every authorization-relevant state
//! change produces exactly one entry in the same unit of work.

use amber_ward_core::{ActorId, AuditEntryId, ChildId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actions recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A grant was created or reactivated.
    AccessGranted,
    /// A grant was revoked.
    AccessRevoked,
    /// A professional created an access request.
    AccessRequested,
    /// A guardian denied an access request.
    AccessRequestDenied,
    /// A professional withdrew their own pending request.
    AccessRequestWithdrawn,
    /// An invitation was issued (or short-circuited into a direct grant).
    InviteSent,
    /// An invite redemption attempt was refused.
    InviteDenied,
    /// Protected content was read. Emitted by consumers of the guard, not
    /// by this core, but recorded in the same ledger.
    RecordViewed,
}

impl AuditAction {
    /// Returns the stable wire name of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessGranted => "ACCESS_GRANTED",
            Self::AccessRevoked => "ACCESS_REVOKED",
            Self::AccessRequested => "ACCESS_REQUESTED",
            Self::AccessRequestDenied => "ACCESS_REQUEST_DENIED",
            Self::AccessRequestWithdrawn => "ACCESS_REQUEST_WITHDRAWN",
            Self::InviteSent => "INVITE_SENT",
            Self::InviteDenied => "INVITE_DENIED",
            Self::RecordViewed => "RECORD_VIEWED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = UnknownAuditValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCESS_GRANTED" => Ok(Self::AccessGranted),
            "ACCESS_REVOKED" => Ok(Self::AccessRevoked),
            "ACCESS_REQUESTED" => Ok(Self::AccessRequested),
            "ACCESS_REQUEST_DENIED" => Ok(Self::AccessRequestDenied),
            "ACCESS_REQUEST_WITHDRAWN" => Ok(Self::AccessRequestWithdrawn),
            "INVITE_SENT" => Ok(Self::InviteSent),
            "INVITE_DENIED" => Ok(Self::InviteDenied),
            "RECORD_VIEWED" => Ok(Self::RecordViewed),
            other => Err(UnknownAuditValue {
                kind: "audit action",
                value: other.to_string(),
            }),
        }
    }
}

/// Kinds of entity an entry can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// An access grant.
    Grant,
    /// An invitation.
    Invite,
    /// An access request.
    AccessRequest,
    /// A child record.
    ChildRecord,
}

impl TargetType {
    /// Returns the stable wire name of the target type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Invite => "invite",
            Self::AccessRequest => "access_request",
            Self::ChildRecord => "child_record",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TargetType {
    type Err = UnknownAuditValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grant" => Ok(Self::Grant),
            "invite" => Ok(Self::Invite),
            "access_request" => Ok(Self::AccessRequest),
            "child_record" => Ok(Self::ChildRecord),
            other => Err(UnknownAuditValue {
                kind: "target type",
                value: other.to_string(),
            }),
        }
    }
}

/// Error returned when parsing an unknown action or target-type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAuditValue {
    /// What was being parsed.
    pub kind: &'static str,
    /// The unrecognized value.
    pub value: String,
}

impl fmt::Display for UnknownAuditValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownAuditValue {}

/// One immutable row in the audit ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry ID.
    pub id: AuditEntryId,
    /// The actor whose action is being recorded.
    pub actor_id: ActorId,
    /// What happened.
    pub action: AuditAction,
    /// The kind of entity acted on.
    pub target_type: TargetType,
    /// The ID of the entity acted on, rendered as its display string.
    pub target_id: String,
    /// The child record the action concerns, when there is one. Kept as a
    /// first-class column so guardians can review their child's trail.
    pub child_id: Option<ChildId>,
    /// Opaque structured payload with action-specific detail.
    pub metadata: serde_json::Value,
    /// Client IP address, when the boundary captured one.
    pub ip_address: Option<String>,
    /// Client user agent, when the boundary captured one.
    pub user_agent: Option<String>,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates a new entry with empty metadata.
    #[must_use]
    pub fn new(
        actor_id: ActorId,
        action: AuditAction,
        target_type: TargetType,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor_id,
            action,
            target_type,
            target_id: target_id.into(),
            child_id: None,
            metadata: serde_json::Value::Null,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches the child record the action concerns.
    #[must_use]
    pub fn with_child(mut self, child_id: ChildId) -> Self {
        self.child_id = Some(child_id);
        self
    }

    /// Attaches action-specific metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches the client IP and user agent captured at the boundary.
    #[must_use]
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_wire_names_are_screaming_snake() {
        assert_eq!(AuditAction::AccessGranted.as_str(), "ACCESS_GRANTED");
        assert_eq!(
            AuditAction::AccessRequestWithdrawn.as_str(),
            "ACCESS_REQUEST_WITHDRAWN"
        );
    }

    #[test]
    fn action_parse_roundtrip() {
        for action in [
            AuditAction::AccessGranted,
            AuditAction::AccessRevoked,
            AuditAction::AccessRequested,
            AuditAction::AccessRequestDenied,
            AuditAction::AccessRequestWithdrawn,
            AuditAction::InviteSent,
            AuditAction::InviteDenied,
            AuditAction::RecordViewed,
        ] {
            let parsed: AuditAction = action.as_str().parse().expect("should parse");
            assert_eq!(parsed, action);
        }
    }

    #[test]
    fn target_type_parse_roundtrip() {
        for target in [
            TargetType::Grant,
            TargetType::Invite,
            TargetType::AccessRequest,
            TargetType::ChildRecord,
        ] {
            let parsed: TargetType = target.as_str().parse().expect("should parse");
            assert_eq!(parsed, target);
        }
    }

    #[test]
    fn unknown_action_rejected() {
        let err = "ACCESS_EVERYTHING".parse::<AuditAction>().unwrap_err();
        assert!(err.to_string().contains("ACCESS_EVERYTHING"));
    }

    #[test]
    fn entry_builder_attaches_context() {
        let actor = ActorId::new();
        let child = ChildId::new();
        let entry = AuditEntry::new(actor, AuditAction::AccessGranted, TargetType::Grant, "grt_x")
            .with_child(child)
            .with_metadata(serde_json::json!({"scopes": ["messages"]}))
            .with_client(Some("203.0.113.9".to_string()), Some("curl/8".to_string()));

        assert_eq!(entry.actor_id, actor);
        assert_eq!(entry.child_id, Some(child));
        assert_eq!(entry.metadata["scopes"][0], "messages");
        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8"));
    }

    #[test]
    fn entry_serde_roundtrip() {
        let entry = AuditEntry::new(
            ActorId::new(),
            AuditAction::InviteSent,
            TargetType::Invite,
            "inv_x",
        )
        .with_child(ChildId::new());

        let json = serde_json::to_string(&entry).expect("serialize");
        let parsed: AuditEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(entry, parsed);
    }

    #[test]
    fn action_serialization_format() {
        let json = serde_json::to_string(&AuditAction::InviteDenied).expect("serialize");
        assert_eq!(json, "\"INVITE_DENIED\"");
    }
}
