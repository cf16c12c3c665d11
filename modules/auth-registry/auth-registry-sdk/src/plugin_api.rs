//! Plugin API traits for identity sources.
//!
//! Concrete identity sources (local directory, LDAP, SAML, ...) implement
//! [`AuthenticationProvider`] and/or [`UserLookupService`]. An
//! [`IdentitySourceFactory`] turns one configuration item into such a source
//! every time the registry reloads.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Authentication, Credentials, PropertyBag, UserDetails};

/// Outcome of a single lookup-service call.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(UserDetails),
    /// The source does not know the user; the chain moves on.
    NotFound,
    /// The source could not answer (network, timeout, misconfiguration).
    Failed(String),
}

/// Resolves user details by username from one identity source.
#[async_trait]
pub trait UserLookupService: Send + Sync {
    /// Look up a user.
    ///
    /// Implementations must not panic on unknown users; they return
    /// [`LookupOutcome::NotFound`] instead.
    async fn load_user(&self, username: &str) -> LookupOutcome;
}

/// Credential verification failures reported by a provider.
#[derive(Debug, Clone, Error)]
pub enum AuthenticationError {
    /// Wrong password or unknown user. The chain continues with the next provider.
    #[error("bad credentials: {0}")]
    BadCredentials(String),

    /// The account is disabled or locked. Stops the chain.
    #[error("account unavailable: {0}")]
    AccountStatus(String),

    /// The provider itself failed. Stops the chain.
    #[error("provider failure: {0}")]
    Internal(String),
}

/// Verifies credentials against one identity source.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Whether this provider can handle the given credentials at all.
    fn supports(&self, _credentials: &Credentials) -> bool {
        true
    }

    /// Verify credentials.
    ///
    /// Returns `Ok(None)` when the provider abstains.
    ///
    /// # Errors
    ///
    /// See [`AuthenticationError`] for how each variant affects the chain.
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Authentication>, AuthenticationError>;
}

/// What a factory built from one configuration item.
#[derive(Clone)]
pub enum IdentitySource {
    Provider(Arc<dyn AuthenticationProvider>),
    LookupService(Arc<dyn UserLookupService>),
    /// A source that both verifies credentials and resolves users.
    Both {
        provider: Arc<dyn AuthenticationProvider>,
        lookup: Arc<dyn UserLookupService>,
    },
}

impl IdentitySource {
    #[must_use]
    pub fn provider(&self) -> Option<&Arc<dyn AuthenticationProvider>> {
        match self {
            Self::Provider(provider) | Self::Both { provider, .. } => Some(provider),
            Self::LookupService(_) => None,
        }
    }

    #[must_use]
    pub fn lookup(&self) -> Option<&Arc<dyn UserLookupService>> {
        match self {
            Self::LookupService(lookup) | Self::Both { lookup, .. } => Some(lookup),
            Self::Provider(_) => None,
        }
    }
}

impl fmt::Debug for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Provider(_) => "Provider",
            Self::LookupService(_) => "LookupService",
            Self::Both { .. } => "Both",
        };
        f.debug_struct("IdentitySource")
            .field("kind", &kind)
            .finish_non_exhaustive()
    }
}

/// Builds identity sources for configuration items whose `type` equals [`kind`](Self::kind).
pub trait IdentitySourceFactory: Send + Sync {
    /// The `type` value this factory handles.
    fn kind(&self) -> &str;

    /// Build the source for item `name`.
    ///
    /// `properties` is the item's full bag, reserved keys included.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the properties do not describe a
    /// usable source.
    fn build(&self, name: &str, properties: &PropertyBag) -> Result<IdentitySource, String>;
}
