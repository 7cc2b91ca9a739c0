//! Actors and their roles.
//!
//! Every core operation takes an explicit [`Actor`] value describing who is
//! acting. There is no ambient "current session" state anywhere in the core;
//! the HTTP boundary resolves the session into an `Actor` and passes it down.

use amber_ward_core::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an actor on the platform.
///
/// The role gates which operations an actor may even attempt. It never
/// grants access to a specific child's protected content by itself; that
/// always requires guardianship or an explicit grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Guardian of one or more child records.
    Guardian,
    /// External clinician.
    Clinician,
    /// External support staff.
    Support,
    /// Platform administrator. Admins have no implicit access to protected
    /// record content; they need an explicit grant like any professional.
    Admin,
    /// The minor patient themself.
    Minor,
}

impl Role {
    /// Returns true for roles that act on records through explicit grants.
    ///
    /// Admin is deliberately included: administrative duties do not bypass
    /// the grant store.
    #[must_use]
    pub fn is_professional(&self) -> bool {
        matches!(self, Self::Clinician | Self::Support | Self::Admin)
    }

    /// Returns the stable wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guardian => "guardian",
            Self::Clinician => "clinician",
            Self::Support => "support",
            Self::Admin => "admin",
            Self::Minor => "minor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guardian" => Ok(Self::Guardian),
            "clinician" => Ok(Self::Clinician),
            "support" => Ok(Self::Support),
            "admin" => Ok(Self::Admin),
            "minor" => Ok(Self::Minor),
            other => Err(UnknownRole {
                value: other.to_string(),
            }),
        }
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole {
    /// The unrecognized value.
    pub value: String,
}

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.value)
    }
}

impl std::error::Error for UnknownRole {}

/// An authenticated actor performing a core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The actor's platform ID.
    pub id: ActorId,
    /// The actor's role.
    pub role: Role,
    /// Email address, used for notifications.
    pub email: Option<String>,
    /// Display name, used in notification copy.
    pub display_name: Option<String>,
}

impl Actor {
    /// Creates an actor with the given id and role.
    #[must_use]
    pub fn new(id: ActorId, role: Role) -> Self {
        Self {
            id,
            role,
            email: None,
            display_name: None,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Returns the display name, falling back to the email, then the id.
    #[must_use]
    pub fn name_for_display(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn professional_roles() {
        assert!(Role::Clinician.is_professional());
        assert!(Role::Support.is_professional());
        assert!(Role::Admin.is_professional());
        assert!(!Role::Guardian.is_professional());
        assert!(!Role::Minor.is_professional());
    }

    #[test]
    fn role_parse_roundtrip() {
        for role in [
            Role::Guardian,
            Role::Clinician,
            Role::Support,
            Role::Admin,
            Role::Minor,
        ] {
            let parsed: Role = role.as_str().parse().expect("should parse");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn role_parse_unknown() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("superuser"));
    }

    #[test]
    fn display_name_fallback() {
        let id = ActorId::new();
        let bare = Actor::new(id, Role::Clinician);
        assert_eq!(bare.name_for_display(), id.to_string());

        let with_email = Actor::new(id, Role::Clinician).with_email("c@example.com");
        assert_eq!(with_email.name_for_display(), "c@example.com");

        let named = Actor::new(id, Role::Clinician)
            .with_email("c@example.com")
            .with_display_name("Dr. C");
        assert_eq!(named.name_for_display(), "Dr. C");
    }
}
