//! Ports to the collaborators the registry does not own.

use std::collections::BTreeMap;

use async_trait::async_trait;
use auth_registry_sdk::{CachedUser, PropertyBag};

use super::error::DomainError;
use super::merge::MergeBatch;

/// Decides whether a trial configuration may become the live one.
#[async_trait]
pub trait TrialValidator: Send + Sync {
    /// `trial` is the full configuration with the batch already merged in.
    async fn accept(&self, trial: &BTreeMap<String, PropertyBag>) -> bool;
}

/// Persistent, named configuration blocks.
///
/// `commit` and `commit_with` are all-or-nothing: a rejected or failed
/// commit leaves every item exactly as it was.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// # Errors
    ///
    /// `ConfigurationRead` when the store is unreachable.
    async fn read(&self, name: &str) -> Result<Option<PropertyBag>, DomainError>;

    /// # Errors
    ///
    /// `ConfigurationRead` when the store is unreachable.
    async fn read_all(&self) -> Result<BTreeMap<String, PropertyBag>, DomainError>;

    /// Merge and persist `batch`. `Ok(false)` means the store rejected it,
    /// including when one of the batch requirements does not hold against
    /// the items as they are at commit time.
    ///
    /// # Errors
    ///
    /// `ConfigurationRead` when the store is unreachable.
    async fn commit(&self, batch: &MergeBatch) -> Result<bool, DomainError>;

    /// Like [`commit`](Self::commit), but only persists when `validator`
    /// accepts the trial configuration.
    ///
    /// # Errors
    ///
    /// `ConfigurationRead` when the store is unreachable.
    async fn commit_with(
        &self,
        batch: &MergeBatch,
        validator: &dyn TrialValidator,
    ) -> Result<bool, DomainError>;
}

/// Storage behind the external-user cache.
///
/// Each operation is atomic for its key.
pub trait UserCacheRepository: Send + Sync {
    fn find(&self, username: &str) -> Option<CachedUser>;

    /// Insert or replace the record for `user.username`.
    fn upsert(&self, user: CachedUser);

    /// Returns `true` if a record was removed.
    fn delete(&self, username: &str) -> bool;
}
