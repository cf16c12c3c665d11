//! Test doubles shared by the domain tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use auth_registry_sdk::{
    Authentication, AuthenticationError, AuthenticationProvider, Credentials, IdentitySource,
    IdentitySourceFactory, LookupOutcome, PropertyBag, UserDetails, UserLookupService,
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use serde_json::Value;

use super::cache::Clock;
use super::error::DomainError;
use super::merge::MergeBatch;
use super::repo::{PropertyStore, TrialValidator};
use super::service::{Service, ServiceConfig};
use crate::infra::storage::{InMemoryPropertyStore, InMemoryUserCache};

pub const PASSWORD: &str = "secret";

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += TimeDelta::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubMode {
    Normal,
    Fail,
    Hang,
}

/// Identity source that knows a fixed set of users, all with [`PASSWORD`].
///
/// Built by [`StubFactory`] from item properties:
/// `users` (array of names), `locked` (array of names), `mode`
/// (`normal` | `fail` | `hang`) and `role` (`provider` | `lookup` | `both`).
pub struct StubSource {
    pub name: String,
    users: BTreeSet<String>,
    locked: BTreeSet<String>,
    mode: StubMode,
    pub lookups: AtomicUsize,
    pub authentications: AtomicUsize,
}

impl StubSource {
    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn authentication_calls(&self) -> usize {
        self.authentications.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserLookupService for StubSource {
    async fn load_user(&self, username: &str) -> LookupOutcome {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            StubMode::Fail => LookupOutcome::Failed(format!("{} is down", self.name)),
            StubMode::Hang => std::future::pending().await,
            StubMode::Normal if self.users.contains(username) => {
                LookupOutcome::Found(UserDetails::new(username).with_roles([self.name.clone()]))
            }
            StubMode::Normal => LookupOutcome::NotFound,
        }
    }
}

#[async_trait]
impl AuthenticationProvider for StubSource {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Authentication>, AuthenticationError> {
        self.authentications.fetch_add(1, Ordering::SeqCst);
        if self.mode == StubMode::Fail {
            return Err(AuthenticationError::Internal(format!("{} is down", self.name)));
        }
        let username = &credentials.username;
        if self.locked.contains(username) {
            return Err(AuthenticationError::AccountStatus(username.clone()));
        }
        if !self.users.contains(username) || credentials.password.expose_secret() != PASSWORD {
            return Err(AuthenticationError::BadCredentials(format!(
                "{} rejected {username}",
                self.name
            )));
        }
        Ok(Some(Authentication {
            username: username.clone(),
            provider: String::new(),
            roles: BTreeSet::from([self.name.clone()]),
        }))
    }
}

/// `type: stub`. Remembers the last source built for every item.
#[derive(Default)]
pub struct StubFactory {
    built: Mutex<HashMap<String, Arc<StubSource>>>,
}

impl StubFactory {
    pub fn source(&self, name: &str) -> Arc<StubSource> {
        Arc::clone(&self.built.lock()[name])
    }
}

fn names(properties: &PropertyBag, key: &str) -> BTreeSet<String> {
    properties
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

impl IdentitySourceFactory for StubFactory {
    fn kind(&self) -> &str {
        "stub"
    }

    fn build(&self, name: &str, properties: &PropertyBag) -> Result<IdentitySource, String> {
        let mode = match properties.get("mode").and_then(Value::as_str) {
            None | Some("normal") => StubMode::Normal,
            Some("fail") => StubMode::Fail,
            Some("hang") => StubMode::Hang,
            Some(other) => return Err(format!("unknown mode `{other}`")),
        };
        let source = Arc::new(StubSource {
            name: name.to_owned(),
            users: names(properties, "users"),
            locked: names(properties, "locked"),
            mode,
            lookups: AtomicUsize::new(0),
            authentications: AtomicUsize::new(0),
        });
        self.built
            .lock()
            .insert(name.to_owned(), Arc::clone(&source));

        match properties.get("role").and_then(Value::as_str) {
            Some("provider") => Ok(IdentitySource::Provider(source)),
            Some("lookup") => Ok(IdentitySource::LookupService(source)),
            None | Some("both") => Ok(IdentitySource::Both {
                provider: source.clone(),
                lookup: source,
            }),
            Some(other) => Err(format!("unknown role `{other}`")),
        }
    }
}

/// Property store that can be switched to refuse every commit, fail every
/// read, or slip a concurrent edit in between a read and the next commit.
pub struct SwitchableStore {
    inner: InMemoryPropertyStore,
    reject: AtomicBool,
    fail_reads: AtomicBool,
    interleaved: Mutex<Option<(String, MergeBatch)>>,
    pub commits: AtomicUsize,
}

impl SwitchableStore {
    pub fn new(inner: InMemoryPropertyStore) -> Self {
        Self {
            inner,
            reject: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            interleaved: Mutex::new(None),
            commits: AtomicUsize::new(0),
        }
    }

    pub fn reject_commits(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Commit `edit` straight to the backing store right after the next
    /// read of item `name`. Not counted in [`commits`](Self::commits).
    pub fn interleave_after_read(&self, name: &str, edit: MergeBatch) {
        *self.interleaved.lock() = Some((name.to_owned(), edit));
    }

    fn check_read(&self) -> Result<(), DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::configuration_read("store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl PropertyStore for SwitchableStore {
    async fn read(&self, name: &str) -> Result<Option<PropertyBag>, DomainError> {
        self.check_read()?;
        let properties = self.inner.read(name).await;
        let edit = {
            let mut slot = self.interleaved.lock();
            if slot.as_ref().is_some_and(|(item, _)| item == name) {
                slot.take()
            } else {
                None
            }
        };
        if let Some((_, edit)) = edit {
            self.inner.commit(&edit).await?;
        }
        properties
    }

    async fn read_all(&self) -> Result<BTreeMap<String, PropertyBag>, DomainError> {
        self.check_read()?;
        self.inner.read_all().await
    }

    async fn commit(&self, batch: &MergeBatch) -> Result<bool, DomainError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.commit(batch).await
    }

    async fn commit_with(
        &self,
        batch: &MergeBatch,
        validator: &dyn TrialValidator,
    ) -> Result<bool, DomainError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.commit_with(batch, validator).await
    }
}

/// A fully wired service over in-memory collaborators.
pub struct Harness {
    pub service: Arc<Service>,
    pub store: Arc<SwitchableStore>,
    pub factory: Arc<StubFactory>,
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserCache>,
}

impl Harness {
    /// Build and initialize a service over `document` (see
    /// [`InMemoryPropertyStore::from_document`]).
    pub async fn start(document: &Value) -> Self {
        Self::start_with(document, ServiceConfig::default()).await
    }

    pub async fn start_with(document: &Value, config: ServiceConfig) -> Self {
        let store = Arc::new(SwitchableStore::new(
            InMemoryPropertyStore::from_document(document).unwrap(),
        ));
        let factory = Arc::new(StubFactory::default());
        let clock = Arc::new(ManualClock::new());
        let users = Arc::new(InMemoryUserCache::new());

        let service = Arc::new(Service::with_clock(
            store.clone(),
            users.clone(),
            vec![factory.clone() as Arc<dyn IdentitySourceFactory>],
            &config,
            clock.clone(),
        ));
        service.init().await.unwrap();

        Self {
            service,
            store,
            factory,
            clock,
            users,
        }
    }
}
