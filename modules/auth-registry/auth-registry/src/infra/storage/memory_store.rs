//! In-process property store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use auth_registry_sdk::PropertyBag;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::domain::merge::MergeBatch;
use crate::domain::repo::{PropertyStore, TrialValidator};

/// Property store kept in memory.
///
/// Commits are serialized: the batch requirements are checked against the
/// current items, the batch is merged into a copy, optionally validated, and
/// only then swapped in. Readers never see a half-applied batch.
#[derive(Debug, Default)]
pub struct InMemoryPropertyStore {
    items: RwLock<BTreeMap<String, PropertyBag>>,
    commit_lock: Mutex<()>,
}

impl InMemoryPropertyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_items(items: BTreeMap<String, PropertyBag>) -> Self {
        Self {
            items: RwLock::new(items),
            commit_lock: Mutex::new(()),
        }
    }

    /// Seed from a document of the form `{ "<item>": { "<key>": <value>, ... }, ... }`.
    ///
    /// # Errors
    ///
    /// `ConfigurationInvalid` if the document or one of its items is not an object.
    pub fn from_document(document: &Value) -> Result<Self, DomainError> {
        let Value::Object(entries) = document else {
            return Err(DomainError::configuration_invalid(
                "<root>",
                "expected an object of items",
            ));
        };

        let mut items = BTreeMap::new();
        for (name, value) in entries {
            let Value::Object(properties) = value else {
                return Err(DomainError::configuration_invalid(
                    name,
                    "expected an object of properties",
                ));
            };
            items.insert(name.clone(), PropertyBag::from(properties.clone()));
        }
        Ok(Self::from_items(items))
    }

    /// `None` if a requirement of `batch` no longer holds.
    fn trial(&self, batch: &MergeBatch) -> Option<BTreeMap<String, PropertyBag>> {
        let mut trial = self.items.read().clone();
        if !batch.holds_in(&trial) {
            debug!(items = batch.len(), "batch requirements do not hold");
            return None;
        }
        batch.apply_to(&mut trial);
        Some(trial)
    }
}

#[async_trait]
impl PropertyStore for InMemoryPropertyStore {
    async fn read(&self, name: &str) -> Result<Option<PropertyBag>, DomainError> {
        Ok(self.items.read().get(name).cloned())
    }

    async fn read_all(&self) -> Result<BTreeMap<String, PropertyBag>, DomainError> {
        Ok(self.items.read().clone())
    }

    async fn commit(&self, batch: &MergeBatch) -> Result<bool, DomainError> {
        let _guard = self.commit_lock.lock().await;
        let Some(next) = self.trial(batch) else {
            return Ok(false);
        };
        *self.items.write() = next;
        debug!(items = batch.len(), "batch committed");
        Ok(true)
    }

    async fn commit_with(
        &self,
        batch: &MergeBatch,
        validator: &dyn TrialValidator,
    ) -> Result<bool, DomainError> {
        let _guard = self.commit_lock.lock().await;
        let Some(trial) = self.trial(batch) else {
            return Ok(false);
        };
        if !validator.accept(&trial).await {
            debug!(items = batch.len(), "trial configuration refused");
            return Ok(false);
        }
        *self.items.write() = trial;
        debug!(items = batch.len(), "batch committed after trial");
        Ok(true)
    }
}
