//! Permission scope catalog.
//!
//! Scopes are the closed set of record categories a grant can authorize.
//! Adding a scope is a schema change, never a runtime operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named category of protected content on a child's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Clinical notes written by clinicians.
    MedicalNotes,
    /// Notes written by support staff.
    SupportNotes,
    /// Direct messages with the care circle.
    Messages,
    /// Video visit rooms and their recordings.
    VideoVisits,
}

impl Scope {
    /// All scopes in the catalog.
    pub const ALL: [Scope; 4] = [
        Scope::MedicalNotes,
        Scope::SupportNotes,
        Scope::Messages,
        Scope::VideoVisits,
    ];

    /// Returns the stable wire name of the scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MedicalNotes => "medical_notes",
            Self::SupportNotes => "support_notes",
            Self::Messages => "messages",
            Self::VideoVisits => "video_visits",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Set of scopes attached to a grant, invite, or access request.
///
/// Construction deduplicates and orders the scopes, so two sets built from
/// the same scopes in any order compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScopeSet {
    scopes: Vec<Scope>,
}

// Deserialization funnels through `from_scopes` so wire input gets the same
// dedup-and-order treatment as any other construction.
impl<'de> Deserialize<'de> for ScopeSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let scopes = Vec::<Scope>::deserialize(deserializer)?;
        Ok(Self::from_scopes(scopes))
    }
}

impl ScopeSet {
    /// Creates an empty scope set.
    #[must_use]
    pub fn empty() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Creates a scope set from a list of scopes, deduplicating.
    #[must_use]
    pub fn from_scopes(scopes: impl IntoIterator<Item = Scope>) -> Self {
        let mut scopes: Vec<Scope> = scopes.into_iter().collect();
        scopes.sort();
        scopes.dedup();
        Self { scopes }
    }

    /// Creates a scope set containing every scope in the catalog.
    #[must_use]
    pub fn all() -> Self {
        Self::from_scopes(Scope::ALL)
    }

    /// Returns true if the set contains the given scope.
    #[must_use]
    pub fn contains(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    /// Adds a scope to the set, keeping it deduplicated and ordered.
    pub fn insert(&mut self, scope: Scope) {
        if let Err(pos) = self.scopes.binary_search(&scope) {
            self.scopes.insert(pos, scope);
        }
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of scopes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns the scopes as a slice, in catalog order.
    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for scope in &self.scopes {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{scope}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        Self::from_scopes(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_wire_names() {
        assert_eq!(Scope::MedicalNotes.as_str(), "medical_notes");
        assert_eq!(Scope::VideoVisits.as_str(), "video_visits");
    }

    #[test]
    fn scope_serialization_format() {
        let json = serde_json::to_string(&Scope::SupportNotes).expect("serialize");
        assert_eq!(json, "\"support_notes\"");
    }

    #[test]
    fn from_scopes_deduplicates() {
        let set = ScopeSet::from_scopes([Scope::Messages, Scope::Messages, Scope::MedicalNotes]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Scope::Messages));
        assert!(set.contains(Scope::MedicalNotes));
    }

    #[test]
    fn from_scopes_order_insensitive_equality() {
        let a = ScopeSet::from_scopes([Scope::Messages, Scope::MedicalNotes]);
        let b = ScopeSet::from_scopes([Scope::MedicalNotes, Scope::Messages]);
        assert_eq!(a, b);
    }

    #[test]
    fn insert_is_idempotent() {
        let mut set = ScopeSet::empty();
        set.insert(Scope::VideoVisits);
        set.insert(Scope::VideoVisits);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_set_contains_nothing() {
        let set = ScopeSet::empty();
        assert!(set.is_empty());
        for scope in Scope::ALL {
            assert!(!set.contains(scope));
        }
    }

    #[test]
    fn all_covers_the_catalog() {
        let set = ScopeSet::all();
        assert_eq!(set.len(), Scope::ALL.len());
        for scope in Scope::ALL {
            assert!(set.contains(scope));
        }
    }

    #[test]
    fn scope_set_serde_roundtrip() {
        let set = ScopeSet::from_scopes([Scope::MedicalNotes, Scope::Messages]);
        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(json, "[\"medical_notes\",\"messages\"]");
        let parsed: ScopeSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(set, parsed);
    }

    #[test]
    fn deserialization_normalizes() {
        let parsed: ScopeSet =
            serde_json::from_str("[\"messages\",\"messages\",\"medical_notes\"]")
                .expect("deserialize");
        assert_eq!(
            parsed,
            ScopeSet::from_scopes([Scope::MedicalNotes, Scope::Messages])
        );
    }
}
