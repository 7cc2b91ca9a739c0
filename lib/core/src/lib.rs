//! Core domain types and utilities for the amber-ward platform.
//!
//! This crate provides the foundational types, error handling, and shared
//! utilities used throughout amber-ward, the care-record coordination
//! platform for minor patients and their care circles.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{
    AccessRequestId, ActorId, AuditEntryId, ChildId, GrantId, InviteId, OutboxMessageId,
};
