//! Domain errors for the auth registry.

use auth_registry_sdk::{AuthRegistryError, AuthenticationError};

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("invalid authentication configuration for [{item}]: {reason}")]
    ConfigurationInvalid { item: String, reason: String },

    #[error("configuration change rejected: {0}")]
    CommitRejected(String),

    #[error("user not found: {username}")]
    UserNotResolvable { username: String },

    #[error("failed to read authentication configuration: {0}")]
    ConfigurationRead(String),

    #[error("authentication is not configured")]
    NotConfigured,

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn configuration_invalid(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            item: item.into(),
            reason: reason.into(),
        }
    }

    pub fn commit_rejected(message: impl Into<String>) -> Self {
        Self::CommitRejected(message.into())
    }

    pub fn configuration_read(message: impl Into<String>) -> Self {
        Self::ConfigurationRead(message.into())
    }

    pub fn user_not_resolvable(username: impl Into<String>) -> Self {
        Self::UserNotResolvable {
            username: username.into(),
        }
    }
}

impl From<AuthRegistryError> for DomainError {
    fn from(e: AuthRegistryError) -> Self {
        match e {
            AuthRegistryError::ConfigurationInvalid { item, reason } => {
                Self::ConfigurationInvalid { item, reason }
            }
            AuthRegistryError::CommitRejected(msg) => Self::CommitRejected(msg),
            AuthRegistryError::UserNotResolvable { username } => {
                Self::UserNotResolvable { username }
            }
            AuthRegistryError::ConfigurationRead(msg) => Self::ConfigurationRead(msg),
            AuthRegistryError::NotConfigured => Self::NotConfigured,
            AuthRegistryError::BadCredentials(msg) => {
                Self::Authentication(AuthenticationError::BadCredentials(msg))
            }
            AuthRegistryError::AccountStatus(msg) => {
                Self::Authentication(AuthenticationError::AccountStatus(msg))
            }
            AuthRegistryError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for AuthRegistryError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ConfigurationInvalid { item, reason } => {
                Self::ConfigurationInvalid { item, reason }
            }
            DomainError::CommitRejected(msg) => Self::CommitRejected(msg),
            DomainError::UserNotResolvable { username } => Self::UserNotResolvable { username },
            DomainError::ConfigurationRead(msg) => Self::ConfigurationRead(msg),
            DomainError::NotConfigured => Self::NotConfigured,
            DomainError::Authentication(AuthenticationError::BadCredentials(msg)) => {
                Self::BadCredentials(msg)
            }
            DomainError::Authentication(AuthenticationError::AccountStatus(msg)) => {
                Self::AccountStatus(msg)
            }
            DomainError::Authentication(AuthenticationError::Internal(msg))
            | DomainError::Internal(msg) => Self::Internal(msg),
        }
    }
}
