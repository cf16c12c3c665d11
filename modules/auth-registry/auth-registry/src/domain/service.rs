//! Registry façade: the single entry point to the provider chains, user
//! resolution and live reconfiguration.
//!
//! Every reconfiguration stages only the keys it changes into one
//! [`MergeBatch`] and commits it atomically, provided the catalog built from
//! the merged configuration is valid. The catalog is reloaded only when the
//! commit went through; a rejected commit leaves both the store and the
//! published catalog untouched.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth_registry_sdk::{
    Authentication, AuthenticationItem, AuthenticationItemUpdate, CachedUser, Credentials,
    CustomItemMapper, IdentitySourceFactory, ORDER_KEY, PropertyBag, UserDetails,
};
use tracing::{info, warn};

use super::cache::{Clock, ExternalUserCache, SystemClock};
use super::catalog::{CatalogSnapshot, ProviderCatalog, priority_key};
use super::error::DomainError;
use super::merge::MergeBatch;
use super::repo::{PropertyStore, TrialValidator, UserCacheRepository};
use super::resolver::ResolutionEngine;
use crate::config::AuthRegistryConfig;

// ============================================================================
// Service Configuration
// ============================================================================

pub struct ServiceConfig {
    pub external_users_ttl: Duration,
    pub lookup_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from(&AuthRegistryConfig::default())
    }
}

impl From<&AuthRegistryConfig> for ServiceConfig {
    fn from(cfg: &AuthRegistryConfig) -> Self {
        Self {
            external_users_ttl: cfg.external_users_ttl(),
            lookup_timeout: cfg.lookup_timeout(),
        }
    }
}

/// Checks a trial catalog before a configuration change goes live.
///
/// Plain predicates `Fn(&CatalogSnapshot) -> bool` implement it too.
#[async_trait]
pub trait CatalogValidator: Send + Sync {
    async fn validate(&self, trial: &CatalogSnapshot) -> bool;
}

#[async_trait]
impl<F> CatalogValidator for F
where
    F: Fn(&CatalogSnapshot) -> bool + Send + Sync,
{
    async fn validate(&self, trial: &CatalogSnapshot) -> bool {
        self(trial)
    }
}

/// Builds the trial catalog for a store-level trial configuration. Without a
/// validator any trial that builds is accepted.
struct CatalogTrial<'a> {
    catalog: &'a ProviderCatalog,
    validator: Option<&'a dyn CatalogValidator>,
}

#[async_trait]
impl TrialValidator for CatalogTrial<'_> {
    async fn accept(&self, trial: &BTreeMap<String, PropertyBag>) -> bool {
        match self.catalog.build(0, trial) {
            Ok(snapshot) => match self.validator {
                Some(validator) => validator.validate(&snapshot).await,
                None => true,
            },
            Err(e) => {
                warn!(error = %e, "trial configuration cannot be built");
                false
            }
        }
    }
}

// ============================================================================
// Service Implementation
// ============================================================================

pub struct Service {
    store: Arc<dyn PropertyStore>,
    catalog: ProviderCatalog,
    resolver: ResolutionEngine,
}

impl Service {
    #[must_use]
    pub fn new(
        store: Arc<dyn PropertyStore>,
        user_cache: Arc<dyn UserCacheRepository>,
        factories: Vec<Arc<dyn IdentitySourceFactory>>,
        config: &ServiceConfig,
    ) -> Self {
        Self::with_clock(store, user_cache, factories, config, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        store: Arc<dyn PropertyStore>,
        user_cache: Arc<dyn UserCacheRepository>,
        factories: Vec<Arc<dyn IdentitySourceFactory>>,
        config: &ServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = ExternalUserCache::new(user_cache, clock, config.external_users_ttl);
        Self {
            catalog: ProviderCatalog::new(Arc::clone(&store), factories),
            resolver: ResolutionEngine::new(cache, config.lookup_timeout),
            store,
        }
    }

    /// First load of the catalog at startup.
    ///
    /// # Errors
    ///
    /// See [`reload`](Self::reload).
    pub async fn init(&self) -> Result<(), DomainError> {
        info!("Initializing auth registry");
        self.reload().await
    }

    /// Rebuild the catalog from the property store.
    ///
    /// Concurrent readers keep using the previous snapshot until the new one
    /// is published; on failure the previous snapshot stays in place.
    ///
    /// # Errors
    ///
    /// - `ConfigurationRead` if the store cannot be read
    /// - `ConfigurationInvalid` if an item cannot be built
    pub async fn reload(&self) -> Result<(), DomainError> {
        info!("Reloading authentication");
        self.catalog.reload().await.map(|_| ())
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.catalog.snapshot()
    }

    #[must_use]
    pub fn user_cache(&self) -> &ExternalUserCache {
        self.resolver.cache()
    }

    /// Verify credentials against the current provider chain.
    ///
    /// # Errors
    ///
    /// See [`CatalogSnapshot::authenticate`].
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Authentication, DomainError> {
        self.catalog.snapshot().authenticate(credentials).await
    }

    /// Resolve a user, keeping the cache record.
    ///
    /// # Errors
    ///
    /// `UserNotResolvable` if no source knows the user.
    pub async fn resolve(&self, username: &str) -> Result<CachedUser, DomainError> {
        let snapshot = self.catalog.snapshot();
        self.resolver.resolve(username, &snapshot).await
    }

    /// # Errors
    ///
    /// `UserNotResolvable` if no source knows the user.
    pub async fn load_user(&self, username: &str) -> Result<UserDetails, DomainError> {
        self.resolve(username).await.map(|record| record.details)
    }

    /// Persisted properties of one item.
    ///
    /// # Errors
    ///
    /// `ConfigurationRead` if the store cannot be read.
    pub async fn item_properties(&self, name: &str) -> Result<Option<PropertyBag>, DomainError> {
        self.store.read(name).await
    }

    /// Current catalog entries joined with their persisted properties,
    /// in priority order.
    ///
    /// # Errors
    ///
    /// `ConfigurationRead` if the store cannot be read.
    pub async fn list_items(&self) -> Result<Vec<AuthenticationItem>, DomainError> {
        let properties = self.store.read_all().await?;
        let snapshot = self.catalog.snapshot();

        let mut items: Vec<AuthenticationItem> = snapshot
            .entries()
            .map(|(name, kind)| {
                AuthenticationItem::new(
                    name,
                    kind,
                    properties.get(name).cloned().unwrap_or_default(),
                )
            })
            .collect();
        items.sort_by(|a, b| {
            priority_key(a.order, &a.name)
                .cmp(&priority_key(b.order, &b.name))
                .then(a.kind.cmp(&b.kind))
        });
        Ok(items)
    }

    /// Swap the `order` of two items.
    ///
    /// The swap only commits if both items still carry the orders read here.
    ///
    /// # Errors
    ///
    /// - `ConfigurationInvalid` if an item is missing or has no `order`
    /// - `CommitRejected` if the store refused the change or an order moved
    ///   in the meantime
    #[tracing::instrument(skip(self))]
    pub async fn reorder(&self, first: &str, second: &str) -> Result<(), DomainError> {
        let first_order = required_order(first, &self.existing_item(first).await?)?;
        let second_order = required_order(second, &self.existing_item(second).await?)?;

        let batch = MergeBatch::new()
            .merge(first, PropertyBag::new().with(ORDER_KEY, second_order))
            .merge(second, PropertyBag::new().with(ORDER_KEY, first_order))
            .require(first, ORDER_KEY, first_order)
            .require(second, ORDER_KEY, second_order);
        self.apply(&batch, None).await
    }

    /// Set `order` and `enabled` of many items in one atomic change.
    ///
    /// # Errors
    ///
    /// - `ConfigurationInvalid` if an item is unknown
    /// - `CommitRejected` if the store refused the change
    #[tracing::instrument(skip_all, fields(count = items.len()))]
    pub async fn update_items(&self, items: &[AuthenticationItemUpdate]) -> Result<(), DomainError> {
        let mut batch = MergeBatch::new();
        for item in items {
            self.existing_item(&item.name).await?;
            let mut properties = PropertyBag::new();
            properties.set_order(item.order);
            properties.set_enabled(item.enabled);
            batch = batch.merge(item.name.clone(), properties);
        }
        self.apply(&batch, None).await
    }

    /// Merge an opaque property bag into item `id`.
    ///
    /// # Errors
    ///
    /// `CommitRejected` if the resulting configuration cannot be built or the
    /// store refused the change.
    #[tracing::instrument(skip(self, properties))]
    pub async fn merge_custom_item(
        &self,
        id: &str,
        properties: PropertyBag,
    ) -> Result<(), DomainError> {
        self.apply(&MergeBatch::new().merge(id, properties), None)
            .await
    }

    /// Like [`merge_custom_item`](Self::merge_custom_item), but the change
    /// only persists if `validator` accepts the catalog built from the trial
    /// configuration.
    ///
    /// # Errors
    ///
    /// `CommitRejected` if the trial cannot be built, the validator refuses
    /// it, or the store refused the change.
    #[tracing::instrument(skip(self, properties, validator))]
    pub async fn test_custom_item(
        &self,
        id: &str,
        properties: PropertyBag,
        validator: &dyn CatalogValidator,
    ) -> Result<(), DomainError> {
        self.apply(&MergeBatch::new().merge(id, properties), Some(validator))
            .await
    }

    /// Typed read of a custom item.
    ///
    /// # Errors
    ///
    /// - `ConfigurationRead` if the store cannot be read
    /// - `ConfigurationInvalid` if the properties do not map to `T`
    pub async fn custom_item<T>(
        &self,
        mapper: &dyn CustomItemMapper<T>,
    ) -> Result<Option<T>, DomainError> {
        let Some(properties) = self.store.read(mapper.item_id()).await? else {
            return Ok(None);
        };
        Ok(Some(mapper.from_properties(&properties)?))
    }

    /// Typed [`merge_custom_item`](Self::merge_custom_item).
    ///
    /// # Errors
    ///
    /// - `ConfigurationInvalid` if `value` does not map to properties
    /// - `CommitRejected` if the store refused the change
    pub async fn put_custom_item<T>(
        &self,
        value: &T,
        mapper: &dyn CustomItemMapper<T>,
    ) -> Result<(), DomainError> {
        let properties = mapper.to_properties(value)?;
        self.merge_custom_item(mapper.item_id(), properties).await
    }

    /// Typed [`test_custom_item`](Self::test_custom_item).
    ///
    /// # Errors
    ///
    /// - `ConfigurationInvalid` if `value` does not map to properties
    /// - `CommitRejected` if the trial fails or the store refused the change
    pub async fn test_mapped_item<T>(
        &self,
        value: &T,
        mapper: &dyn CustomItemMapper<T>,
        validator: &dyn CatalogValidator,
    ) -> Result<(), DomainError> {
        let properties = mapper.to_properties(value)?;
        self.test_custom_item(mapper.item_id(), properties, validator)
            .await
    }

    async fn existing_item(&self, name: &str) -> Result<PropertyBag, DomainError> {
        self.store
            .read(name)
            .await?
            .ok_or_else(|| DomainError::configuration_invalid(name, "no such item"))
    }

    async fn apply(
        &self,
        batch: &MergeBatch,
        validator: Option<&dyn CatalogValidator>,
    ) -> Result<(), DomainError> {
        let trial = CatalogTrial {
            catalog: &self.catalog,
            validator,
        };
        if !self.store.commit_with(batch, &trial).await? {
            let items: Vec<&str> = batch.item_names().collect();
            info!(?items, "configuration change rejected, keeping current catalog");
            return Err(DomainError::commit_rejected(format!(
                "change to [{}] was not applied",
                items.join(", ")
            )));
        }

        self.catalog.reload().await.map(|_| ())
    }
}

fn required_order(name: &str, properties: &PropertyBag) -> Result<i64, DomainError> {
    properties
        .order()
        .ok_or_else(|| DomainError::configuration_invalid(name, "missing `order`"))
}
