//! Typed read filters for the ledger.
//!
//! Compliance surfaces query by actor, action, target, child, and time
//! range, with pagination. The filter is a concrete struct rather than a
//! generic key/value map, so an invalid filter shape fails to compile.

use crate::entry::{AuditAction, TargetType};
use amber_ward_core::{ActorId, ChildId};
use chrono::{DateTime, Utc};

/// Filter over audit entries. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Match entries recorded for this actor.
    pub actor_id: Option<ActorId>,
    /// Match entries with this action.
    pub action: Option<AuditAction>,
    /// Match entries targeting this kind of entity.
    pub target_type: Option<TargetType>,
    /// Match entries targeting this entity.
    pub target_id: Option<String>,
    /// Match entries concerning this child.
    pub child_id: Option<ChildId>,
    /// Match entries created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Match entries created before this instant.
    pub until: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// Matches every entry.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts to one actor.
    #[must_use]
    pub fn actor(mut self, actor_id: ActorId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Restricts to one action.
    #[must_use]
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Restricts to one target.
    #[must_use]
    pub fn target(mut self, target_type: TargetType, target_id: impl Into<String>) -> Self {
        self.target_type = Some(target_type);
        self.target_id = Some(target_id.into());
        self
    }

    /// Restricts to one child record.
    #[must_use]
    pub fn child(mut self, child_id: ChildId) -> Self {
        self.child_id = Some(child_id);
        self
    }

    /// Restricts to a time range. Either bound may be open.
    #[must_use]
    pub fn between(mut self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self.until = until;
        self
    }
}

/// Pagination window for ledger reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum entries to return.
    pub limit: i64,
    /// Entries to skip from the newest end.
    pub offset: i64,
}

impl Page {
    /// Default page size.
    pub const DEFAULT_LIMIT: i64 = 50;
    /// Upper bound a caller can request.
    pub const MAX_LIMIT: i64 = 200;

    /// Creates a page, clamping the limit into `1..=MAX_LIMIT` and the
    /// offset to non-negative.
    #[must_use]
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset: offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_everything() {
        let filter = AuditFilter::any();
        assert_eq!(filter, AuditFilter::default());
        assert!(filter.actor_id.is_none());
        assert!(filter.since.is_none());
    }

    #[test]
    fn builder_composes() {
        let actor = ActorId::new();
        let child = ChildId::new();
        let filter = AuditFilter::any()
            .actor(actor)
            .action(AuditAction::AccessRevoked)
            .target(TargetType::Grant, "grt_x")
            .child(child);

        assert_eq!(filter.actor_id, Some(actor));
        assert_eq!(filter.action, Some(AuditAction::AccessRevoked));
        assert_eq!(filter.target_type, Some(TargetType::Grant));
        assert_eq!(filter.target_id.as_deref(), Some("grt_x"));
        assert_eq!(filter.child_id, Some(child));
    }

    #[test]
    fn page_clamps_limit() {
        assert_eq!(Page::new(0, 0).limit, 1);
        assert_eq!(Page::new(10_000, 0).limit, Page::MAX_LIMIT);
        assert_eq!(Page::new(25, 0).limit, 25);
    }

    #[test]
    fn page_clamps_offset() {
        assert_eq!(Page::new(10, -5).offset, 0);
        assert_eq!(Page::new(10, 30).offset, 30);
    }

    #[test]
    fn default_page() {
        let page = Page::default();
        assert_eq!(page.limit, Page::DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
    }
}
