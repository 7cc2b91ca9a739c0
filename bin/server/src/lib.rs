//! HTTP server for the amber-ward care-record coordination platform.
//!
//! Exposes the access-control surface over a minor patient's health record:
//! invitations into the care circle, professional access requests, grant
//! listing and revocation, the authorization guard, and the guardian-facing
//! audit view. Every state change commits together with its audit entry.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod service;
