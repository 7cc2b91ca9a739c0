//! Outbound notification collaborator interface.
//!
//! Email delivery is external to this core. Implementations report
//! delivered/not-delivered, but a failed send never fails the operation
//! that produced it; the server's outbox worker owns retries.

use crate::scope::ScopeSet;
use crate::token::TokenSecret;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Sends care-circle emails. Implemented outside this core.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends an invitation carrying the token plaintext. This is the one
    /// place the plaintext leaves the process.
    async fn send_invite(
        &self,
        email: &str,
        sender_name: &str,
        child_name: &str,
        token: &TokenSecret,
        scopes: &ScopeSet,
        expires_at: DateTime<Utc>,
    ) -> bool;

    /// Tells a professional their access was granted.
    async fn send_access_granted(
        &self,
        email: &str,
        name: &str,
        sender_name: &str,
        child_name: &str,
        scopes: &ScopeSet,
    ) -> bool;

    /// Tells a professional their access was revoked.
    async fn send_access_revoked(&self, email: &str, name: &str, child_name: &str) -> bool;

    /// Tells a professional their access request was denied.
    async fn send_request_denied(&self, email: &str, name: &str, child_name: &str) -> bool;
}

/// Notifier that logs instead of sending. Used in development and tests,
/// and as the default when no mail transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_invite(
        &self,
        email: &str,
        sender_name: &str,
        child_name: &str,
        _token: &TokenSecret,
        scopes: &ScopeSet,
        expires_at: DateTime<Utc>,
    ) -> bool {
        // The token itself is never logged.
        tracing::info!(
            recipient = email,
            sender = sender_name,
            child = child_name,
            %scopes,
            %expires_at,
            "would send invite email"
        );
        true
    }

    async fn send_access_granted(
        &self,
        email: &str,
        name: &str,
        sender_name: &str,
        child_name: &str,
        scopes: &ScopeSet,
    ) -> bool {
        tracing::info!(
            recipient = email,
            name,
            sender = sender_name,
            child = child_name,
            %scopes,
            "would send access-granted email"
        );
        true
    }

    async fn send_access_revoked(&self, email: &str, name: &str, child_name: &str) -> bool {
        tracing::info!(
            recipient = email,
            name,
            child = child_name,
            "would send access-revoked email"
        );
        true
    }

    async fn send_request_denied(&self, email: &str, name: &str, child_name: &str) -> bool {
        tracing::info!(
            recipient = email,
            name,
            child = child_name,
            "would send request-denied email"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    #[tokio::test]
    async fn logging_notifier_reports_delivered() {
        let notifier = LoggingNotifier;
        let token = TokenSecret::generate();
        let scopes = ScopeSet::from_scopes([Scope::Messages]);

        assert!(
            notifier
                .send_invite(
                    "new.clinician@example.com",
                    "Avery",
                    "Sam",
                    &token,
                    &scopes,
                    Utc::now(),
                )
                .await
        );
        assert!(
            notifier
                .send_access_revoked("c@example.com", "Dr. C", "Sam")
                .await
        );
    }
}
