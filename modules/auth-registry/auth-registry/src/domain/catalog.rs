//! Provider catalog: immutable, versioned snapshots of the identity-source chains.
//!
//! A reload reads every configuration item, builds fresh provider and
//! lookup-service lists and publishes them with one atomic swap. Readers
//! always see either the previous snapshot or the new one in full.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use auth_registry_sdk::{
    Authentication, AuthenticationError, AuthenticationProvider, Credentials,
    IdentitySourceFactory, ItemKind, PropertyBag, UserLookupService,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::DomainError;
use super::repo::PropertyStore;

/// Sort key for the global priority sequence: `(order, name)`, unordered items last.
pub(crate) fn priority_key(order: Option<i64>, name: &str) -> (bool, i64, &str) {
    (order.is_none(), order.unwrap_or_default(), name)
}

pub struct ProviderEntry {
    pub name: String,
    pub order: Option<i64>,
    pub enabled: bool,
    pub provider: Arc<dyn AuthenticationProvider>,
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

pub struct LookupServiceEntry {
    /// Item name; stamped on every user this service resolves.
    pub source_id: String,
    pub order: Option<i64>,
    pub enabled: bool,
    pub service: Arc<dyn UserLookupService>,
}

impl fmt::Debug for LookupServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupServiceEntry")
            .field("source_id", &self.source_id)
            .field("order", &self.order)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// One published state of the catalog.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    version: u64,
    providers: Vec<ProviderEntry>,
    lookup_services: Vec<LookupServiceEntry>,
}

impl CatalogSnapshot {
    /// Incremented on every successful reload; `0` before the first one.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Enabled providers in priority order.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.providers.iter().filter(|entry| entry.enabled)
    }

    /// Enabled lookup services in priority order.
    pub fn lookup_services(&self) -> impl Iterator<Item = &LookupServiceEntry> {
        self.lookup_services.iter().filter(|entry| entry.enabled)
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers().map(|entry| entry.name.as_str()).collect()
    }

    #[must_use]
    pub fn lookup_service(&self, source_id: &str) -> Option<&LookupServiceEntry> {
        self.lookup_services
            .iter()
            .find(|entry| entry.source_id == source_id)
    }

    /// Every entry, enabled or not, as `(name, kind)`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, ItemKind)> {
        self.providers
            .iter()
            .map(|entry| (entry.name.as_str(), ItemKind::AuthenticationProvider))
            .chain(
                self.lookup_services
                    .iter()
                    .map(|entry| (entry.source_id.as_str(), ItemKind::UserLookupService)),
            )
    }

    /// Verify credentials against the enabled providers in priority order.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` when no provider is enabled
    /// - the last `BadCredentials` when nobody accepted the credentials
    /// - `AccountStatus` / `Internal` from the provider that stopped the chain
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Authentication, DomainError> {
        if self.providers().next().is_none() {
            return Err(DomainError::NotConfigured);
        }

        let mut last_error = None;
        for entry in self.providers() {
            if !entry.provider.supports(credentials) {
                continue;
            }
            match entry.provider.authenticate(credentials).await {
                Ok(Some(mut authentication)) => {
                    debug!(provider = %entry.name, username = %credentials.username, "authenticated");
                    authentication.provider.clone_from(&entry.name);
                    return Ok(authentication);
                }
                Ok(None) => {}
                Err(AuthenticationError::BadCredentials(reason)) => {
                    debug!(provider = %entry.name, %reason, "credentials rejected");
                    last_error = Some(AuthenticationError::BadCredentials(reason));
                }
                Err(e) => {
                    warn!(provider = %entry.name, error = %e, "authentication aborted");
                    return Err(e.into());
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AuthenticationError::BadCredentials(credentials.username.clone()))
            .into())
    }
}

/// Builds snapshots from the property store and publishes them.
pub struct ProviderCatalog {
    store: Arc<dyn PropertyStore>,
    factories: HashMap<String, Arc<dyn IdentitySourceFactory>>,
    current: ArcSwap<CatalogSnapshot>,
    reload_lock: Mutex<()>,
}

impl ProviderCatalog {
    #[must_use]
    pub fn new(
        store: Arc<dyn PropertyStore>,
        factories: impl IntoIterator<Item = Arc<dyn IdentitySourceFactory>>,
    ) -> Self {
        let mut by_kind = HashMap::new();
        for factory in factories {
            let kind = factory.kind().to_owned();
            if by_kind.insert(kind.clone(), factory).is_some() {
                warn!(kind = %kind, "duplicate identity source factory, keeping the last one");
            }
        }
        Self {
            store,
            factories: by_kind,
            current: ArcSwap::from_pointee(CatalogSnapshot::default()),
            reload_lock: Mutex::new(()),
        }
    }

    /// The currently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.load_full()
    }

    /// Re-read the store, rebuild both chains and publish them.
    ///
    /// On failure the previous snapshot stays published.
    ///
    /// # Errors
    ///
    /// - `ConfigurationRead` if the store cannot be read
    /// - `ConfigurationInvalid` if an item cannot be built
    pub async fn reload(&self) -> Result<Arc<CatalogSnapshot>, DomainError> {
        let _guard = self.reload_lock.lock().await;

        let items = self.store.read_all().await.inspect_err(|e| {
            warn!(error = %e, "reload aborted, keeping previous catalog");
        })?;
        let version = self.current.load().version + 1;
        let next = Arc::new(self.build(version, &items).inspect_err(|e| {
            warn!(error = %e, "reload aborted, keeping previous catalog");
        })?);

        self.current.store(Arc::clone(&next));
        info!(
            version,
            providers = next.providers().count(),
            lookup_services = next.lookup_services().count(),
            "authentication catalog reloaded"
        );
        Ok(next)
    }

    /// Build a snapshot for `items` without publishing it.
    ///
    /// Items without a `type` are plain settings blocks and are skipped.
    ///
    /// # Errors
    ///
    /// `ConfigurationInvalid` if an item names an unknown `type` or its factory fails.
    pub fn build(
        &self,
        version: u64,
        items: &BTreeMap<String, PropertyBag>,
    ) -> Result<CatalogSnapshot, DomainError> {
        let mut providers = Vec::new();
        let mut lookup_services = Vec::new();

        for (name, properties) in items {
            let Some(kind) = properties.source_type() else {
                debug!(item = %name, "no `type`, not an identity source");
                continue;
            };
            let factory = self.factories.get(kind).ok_or_else(|| {
                DomainError::configuration_invalid(name, format!("unknown type `{kind}`"))
            })?;
            let source = factory
                .build(name, properties)
                .map_err(|reason| DomainError::configuration_invalid(name, reason))?;

            let order = properties.order();
            let enabled = properties.enabled();
            if let Some(provider) = source.provider() {
                providers.push(ProviderEntry {
                    name: name.clone(),
                    order,
                    enabled,
                    provider: Arc::clone(provider),
                });
            }
            if let Some(service) = source.lookup() {
                lookup_services.push(LookupServiceEntry {
                    source_id: name.clone(),
                    order,
                    enabled,
                    service: Arc::clone(service),
                });
            }
        }

        providers
            .sort_by(|a, b| priority_key(a.order, &a.name).cmp(&priority_key(b.order, &b.name)));
        lookup_services.sort_by(|a, b| {
            priority_key(a.order, &a.source_id).cmp(&priority_key(b.order, &b.source_id))
        });

        Ok(CatalogSnapshot {
            version,
            providers,
            lookup_services,
        })
    }
}

impl fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("ProviderCatalog")
            .field("factories", &kinds)
            .field("version", &self.current.load().version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use async_trait::async_trait;
    use auth_registry_sdk::{ENABLED_KEY, IdentitySource, LookupOutcome, ORDER_KEY, TYPE_KEY};

    use super::*;
    use crate::infra::storage::InMemoryPropertyStore;

    struct Named(String);

    #[async_trait]
    impl AuthenticationProvider for Named {
        async fn authenticate(
            &self,
            credentials: &Credentials,
        ) -> Result<Option<Authentication>, AuthenticationError> {
            if credentials.username == self.0 {
                Ok(Some(Authentication {
                    username: credentials.username.clone(),
                    provider: String::new(),
                    roles: std::collections::BTreeSet::new(),
                }))
            } else {
                Err(AuthenticationError::BadCredentials(self.0.clone()))
            }
        }
    }

    #[async_trait]
    impl UserLookupService for Named {
        async fn load_user(&self, _username: &str) -> LookupOutcome {
            LookupOutcome::NotFound
        }
    }

    /// `type: test` builds a source that accepts only the user named like the item.
    struct TestFactory;

    impl IdentitySourceFactory for TestFactory {
        fn kind(&self) -> &str {
            "test"
        }

        fn build(&self, name: &str, properties: &PropertyBag) -> Result<IdentitySource, String> {
            if properties.get("broken").is_some() {
                return Err("broken on purpose".to_owned());
            }
            let source = Arc::new(Named(name.to_owned()));
            Ok(IdentitySource::Both {
                provider: source.clone(),
                lookup: source,
            })
        }
    }

    fn item(order: Option<i64>) -> PropertyBag {
        let mut bag = PropertyBag::new().with(TYPE_KEY, "test");
        if let Some(order) = order {
            bag.set_order(Some(order));
        }
        bag
    }

    fn catalog(items: Vec<(&str, PropertyBag)>) -> ProviderCatalog {
        let store = InMemoryPropertyStore::from_items(
            items
                .into_iter()
                .map(|(name, bag)| (name.to_owned(), bag))
                .collect(),
        );
        ProviderCatalog::new(
            Arc::new(store),
            [Arc::new(TestFactory) as Arc<dyn IdentitySourceFactory>],
        )
    }

    #[tokio::test]
    async fn providers_follow_order_then_name() {
        let catalog = catalog(vec![
            ("zeta", item(Some(1))),
            ("alpha", item(Some(1))),
            ("first", item(Some(0))),
            ("unordered", item(None)),
        ]);

        let snapshot = catalog.reload().await.unwrap();
        assert_eq!(
            snapshot.provider_names(),
            vec!["first", "alpha", "zeta", "unordered"]
        );
        let lookups: Vec<&str> = snapshot
            .lookup_services()
            .map(|e| e.source_id.as_str())
            .collect();
        assert_eq!(lookups, vec!["first", "alpha", "zeta", "unordered"]);
    }

    #[tokio::test]
    async fn disabled_items_stay_listed_but_leave_the_chain() {
        let catalog = catalog(vec![
            ("ldap", item(Some(1)).with(ENABLED_KEY, false)),
            ("local", item(Some(2))),
        ]);

        let snapshot = catalog.reload().await.unwrap();
        assert_eq!(snapshot.provider_names(), vec!["local"]);
        assert!(snapshot.lookup_service("ldap").is_some());
        assert_eq!(snapshot.entries().count(), 4);
    }

    #[tokio::test]
    async fn typeless_items_are_not_sources() {
        let catalog = catalog(vec![
            ("settings", PropertyBag::new().with(ORDER_KEY, 1)),
            ("local", item(Some(2))),
        ]);

        let snapshot = catalog.reload().await.unwrap();
        assert_eq!(snapshot.provider_names(), vec!["local"]);
    }

    #[tokio::test]
    async fn failed_build_keeps_previous_snapshot() {
        let store = Arc::new(InMemoryPropertyStore::from_items(BTreeMap::from([(
            "local".to_owned(),
            item(Some(1)),
        )])));
        let catalog = ProviderCatalog::new(
            store.clone(),
            [Arc::new(TestFactory) as Arc<dyn IdentitySourceFactory>],
        );
        let first = catalog.reload().await.unwrap();
        assert_eq!(first.version(), 1);

        let committed = store
            .commit(&crate::domain::merge::MergeBatch::new().merge(
                "ldap",
                item(Some(0)).with("broken", true),
            ))
            .await
            .unwrap();
        assert!(committed);

        let err = catalog.reload().await.unwrap_err();
        assert!(matches!(err, DomainError::ConfigurationInvalid { ref item, .. } if item == "ldap"));
        assert_eq!(catalog.snapshot().version(), 1);
        assert_eq!(catalog.snapshot().provider_names(), vec!["local"]);
    }

    #[tokio::test]
    async fn unknown_type_is_invalid() {
        let catalog = catalog(vec![("saml", PropertyBag::new().with(TYPE_KEY, "saml"))]);

        let err = catalog.reload().await.unwrap_err();
        assert!(err.to_string().contains("unknown type `saml`"));
    }

    #[tokio::test]
    async fn authenticate_walks_chain_in_order() {
        let catalog = catalog(vec![("bob", item(Some(2))), ("alice", item(Some(1)))]);
        let snapshot = catalog.reload().await.unwrap();

        let auth = snapshot
            .authenticate(&Credentials::new("bob", "pw"))
            .await
            .unwrap();
        assert_eq!(auth.provider, "bob");

        let err = snapshot
            .authenticate(&Credentials::new("carol", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Authentication(AuthenticationError::BadCredentials(ref who)) if who == "bob"
        ));
    }

    #[tokio::test]
    async fn empty_chain_is_not_configured() {
        let catalog = catalog(vec![]);
        let snapshot = catalog.reload().await.unwrap();

        let err = snapshot
            .authenticate(&Credentials::new("alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotConfigured));
    }
}
