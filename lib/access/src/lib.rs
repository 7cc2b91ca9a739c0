//! Access control for amber-ward: who may act on which category of a
//! child's protected record, and how that permission comes to exist.
//!
//! This crate provides:
//! - The closed scope catalog (`Scope`, `ScopeSet`)
//! - Actors and roles (`Actor`, `Role`)
//! - Child record ownership (`ChildRecord`)
//! - The authoritative grant record (`Grant`)
//! - Single-use invite tokens (`Invite`, `token`)
//! - The access-request state machine (`AccessRequest`, `RequestStatus`)
//! - The authorization guard (`decide`, `AccessDecision`)
//! - The notification collaborator seam (`Notifier`)
//!
//! # Access Control Model
//!
//! A guardian has implicit, ungated access to their own child's record.
//! Every other actor -- including admins -- needs an active [`Grant`] whose
//! scope set contains the category being touched. Grants are created by
//! invite redemption or access-request approval, and only ever revoked, not
//! deleted.
//!
//! # Example
//!
//! ```
//! use amber_ward_access::{
//!     Actor, AccessDecision, ChildRecord, Grant, Role, Scope, ScopeSet, decide,
//! };
//! use amber_ward_core::ActorId;
//!
//! let guardian = Actor::new(ActorId::new(), Role::Guardian);
//! let child = ChildRecord::new(guardian.id, "Sam");
//! let clinician = Actor::new(ActorId::new(), Role::Clinician);
//!
//! // No grant yet: denied.
//! assert_eq!(
//!     decide(&clinician, &child, None, Scope::MedicalNotes),
//!     AccessDecision::Deny,
//! );
//!
//! // The guardian approves medical-notes access.
//! let grant = Grant::new(
//!     child.id,
//!     clinician.id,
//!     ScopeSet::from_scopes([Scope::MedicalNotes]),
//!     guardian.id,
//! );
//! assert_eq!(
//!     decide(&clinician, &child, Some(&grant), Scope::MedicalNotes),
//!     AccessDecision::Allow,
//! );
//! ```

pub mod actor;
pub mod child;
pub mod error;
pub mod grant;
pub mod guard;
pub mod invite;
pub mod notify;
pub mod request;
pub mod scope;
pub mod token;

// Re-export main types at crate root
pub use actor::{Actor, Role};
pub use child::ChildRecord;
pub use error::AccessError;
pub use grant::Grant;
pub use guard::{AccessDecision, decide};
pub use invite::{INVITE_TTL_DAYS, Invite};
pub use notify::{LoggingNotifier, Notifier};
pub use request::{AccessRequest, RequestStatus};
pub use scope::{Scope, ScopeSet};
pub use token::TokenSecret;
