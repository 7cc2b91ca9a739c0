//! Child record ownership.

use amber_ward_core::{ActorId, ChildId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A minor patient's record, owned exclusively by its guardian.
///
/// The guardian's access to this record is implicit and never represented
/// as a grant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRecord {
    /// Record ID.
    pub id: ChildId,
    /// The guardian who owns this record.
    pub guardian_id: ActorId,
    /// The child's name.
    pub name: String,
    /// The child's date of birth, when recorded.
    pub date_of_birth: Option<NaiveDate>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ChildRecord {
    /// Creates a new child record owned by the given guardian.
    #[must_use]
    pub fn new(guardian_id: ActorId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ChildId::new(),
            guardian_id,
            name: name.into(),
            date_of_birth: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the date of birth.
    #[must_use]
    pub fn with_date_of_birth(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    /// Returns true if the given actor is the guardian of record.
    #[must_use]
    pub fn is_guardian(&self, actor_id: ActorId) -> bool {
        self.guardian_id == actor_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guardian_of_record() {
        let guardian = ActorId::new();
        let child = ChildRecord::new(guardian, "Sam");
        assert!(child.is_guardian(guardian));
        assert!(!child.is_guardian(ActorId::new()));
    }
}
