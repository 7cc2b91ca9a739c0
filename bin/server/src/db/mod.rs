//! Database repositories for the amber-ward platform.
//!
//! Repositories hold a `PgPool` for reads. Write methods instead take a
//! `&mut PgConnection` so the service layer can compose a state change, its
//! audit entry, and any outbox message into one transaction.

pub mod actor;
pub mod audit;
pub mod child;
pub mod grant;
pub mod invite;
pub mod outbox;
pub mod request;
pub mod session;

pub use actor::ActorRepository;
pub use audit::AuditRepository;
pub use child::ChildRepository;
pub use grant::GrantRepository;
pub use invite::InviteRepository;
pub use outbox::{NotificationPayload, OutboxMessage, OutboxRepository};
pub use request::AccessRequestRepository;
pub use session::{SessionRecord, SessionRepository};

/// Builds a `sqlx` decode error for a row field that failed conversion.
pub(crate) fn decode_error(
    field: &str,
    value: &str,
    err: impl std::fmt::Display,
) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid {field} '{value}': {err}"),
    )))
}
