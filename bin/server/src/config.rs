//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.

use serde::Deserialize;

/// Server configuration composed from sub-configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address and port the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Invitation configuration.
    #[serde(default)]
    pub invite: InviteConfig,

    /// Notification outbox configuration.
    #[serde(default)]
    pub outbox: OutboxConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Invitation-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InviteConfig {
    /// Invite token lifetime in days.
    #[serde(default = "default_invite_ttl_days")]
    pub ttl_days: i64,

    /// Interval between expired-invite/session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_invite_ttl_days() -> i64 {
    amber_ward_access::INVITE_TTL_DAYS
}

fn default_cleanup_interval_seconds() -> u64 {
    3600
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_invite_ttl_days(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

/// Notification outbox worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutboxConfig {
    /// Interval between delivery polls, in seconds.
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Attempts before a message is marked failed for good.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
}

fn default_poll_interval_seconds() -> u64 {
    30
}

fn default_max_attempts() -> i32 {
    5
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval_seconds(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_config_has_correct_defaults() {
        let config = InviteConfig::default();
        assert_eq!(config.ttl_days, 7);
        assert_eq!(config.cleanup_interval_seconds, 3600);
    }

    #[test]
    fn outbox_config_has_correct_defaults() {
        let config = OutboxConfig::default();
        assert_eq!(config.poll_interval_seconds, 30);
        assert_eq!(config.max_attempts, 5);
    }
}
