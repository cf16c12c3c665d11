//! Error types for the `auth_registry` module.

use thiserror::Error;

/// Errors that can occur when using the auth registry API.
#[derive(Debug, Error)]
pub enum AuthRegistryError {
    /// A configuration item is missing or lacks a required field.
    #[error("invalid authentication configuration for [{item}]: {reason}")]
    ConfigurationInvalid { item: String, reason: String },

    /// The property store refused the change; the previous configuration is still in effect.
    #[error("configuration change rejected: {0}")]
    CommitRejected(String),

    /// Neither the cache nor any lookup service knows the user.
    #[error("user not found: {username}")]
    UserNotResolvable { username: String },

    /// The property store could not be read.
    #[error("failed to read authentication configuration: {0}")]
    ConfigurationRead(String),

    /// No authentication provider is enabled.
    #[error("authentication is not configured")]
    NotConfigured,

    /// The credentials were not accepted by any provider.
    #[error("bad credentials: {0}")]
    BadCredentials(String),

    /// The account exists but may not sign in (disabled, locked, ...).
    #[error("account unavailable: {0}")]
    AccountStatus(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthRegistryError {
    pub fn configuration_invalid(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            item: item.into(),
            reason: reason.into(),
        }
    }
}
