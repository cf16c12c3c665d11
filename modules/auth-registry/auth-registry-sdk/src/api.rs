//! Public API trait for the auth registry.
//!
//! Consumed by the credential-verification layer and by the operator-facing
//! reconfiguration endpoints.

use async_trait::async_trait;

use crate::error::AuthRegistryError;
use crate::models::{
    Authentication, AuthenticationItem, AuthenticationItemUpdate, Credentials, UserDetails,
};

/// Public API trait for the auth registry.
///
/// ```ignore
/// let registry: Arc<dyn AuthRegistryClient> = Arc::new(AuthRegistryLocalClient::new(service));
///
/// registry.reorder("ldap", "local").await?;
/// let items = registry.list_items().await?;
/// ```
#[async_trait]
pub trait AuthRegistryClient: Send + Sync {
    /// Verify credentials against the provider chain.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` if no provider is enabled
    /// - `BadCredentials` if no provider accepted the credentials
    /// - `AccountStatus` / `Internal` if a provider stopped the chain
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Authentication, AuthRegistryError>;

    /// Resolve a user through the external-user cache and the lookup-service chain.
    ///
    /// # Errors
    ///
    /// - `UserNotResolvable` if the user is unknown to every source
    async fn load_user(&self, username: &str) -> Result<UserDetails, AuthRegistryError>;

    /// Current items with their persisted configuration, by ascending `order`.
    ///
    /// # Errors
    ///
    /// - `ConfigurationRead` if the property store is unreachable
    async fn list_items(&self) -> Result<Vec<AuthenticationItem>, AuthRegistryError>;

    /// Swap the `order` of two items.
    ///
    /// # Errors
    ///
    /// - `ConfigurationInvalid` if either item is missing or has no `order`
    /// - `CommitRejected` if the property store refused the change
    async fn reorder(&self, first: &str, second: &str) -> Result<(), AuthRegistryError>;

    /// Apply priority and enablement for many items as one atomic change.
    ///
    /// # Errors
    ///
    /// - `ConfigurationInvalid` if an item is unknown
    /// - `CommitRejected` if the property store refused the change
    async fn update_items(
        &self,
        items: Vec<AuthenticationItemUpdate>,
    ) -> Result<(), AuthRegistryError>;

    /// Rebuild the catalog from the property store.
    ///
    /// # Errors
    ///
    /// - `ConfigurationRead` / `ConfigurationInvalid`; the previous catalog stays active
    async fn reload(&self) -> Result<(), AuthRegistryError>;
}
