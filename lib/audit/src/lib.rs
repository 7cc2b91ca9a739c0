//! Append-only audit ledger for amber-ward.
//!
//! Every authorization-relevant event -- grants, revocations, requests and
//! their outcomes, invite issuance and refusals, record views -- lands here
//! as an immutable [`AuditEntry`], written in the same unit of work as the
//! state change it documents. The public contract has no update or delete.

pub mod entry;
pub mod filter;

pub use entry::{AuditAction, AuditEntry, TargetType, UnknownAuditValue};
pub use filter::{AuditFilter, Page};
