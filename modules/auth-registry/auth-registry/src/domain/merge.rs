//! Batched configuration edits.

use std::collections::BTreeMap;

use auth_registry_sdk::PropertyBag;
use serde_json::Value;

/// A set of per-item property edits committed as one unit.
///
/// Edits to the same item accumulate; later keys overwrite earlier ones.
/// Requirements recorded with [`require`](Self::require) are checked by the
/// store against the configuration it is about to change; if one does not
/// hold, the whole batch is rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeBatch {
    edits: BTreeMap<String, PropertyBag>,
    required: Vec<(String, String, Value)>,
}

impl MergeBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `properties` for item `name`.
    #[must_use]
    pub fn merge(mut self, name: impl Into<String>, properties: PropertyBag) -> Self {
        self.edits
            .entry(name.into())
            .and_modify(|staged| staged.merge(&properties))
            .or_insert(properties);
        self
    }

    /// Require item `name` to hold `value` under `key` at commit time.
    #[must_use]
    pub fn require(
        mut self,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.required.push((name.into(), key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.edits.keys().map(String::as_str)
    }

    /// Whether every requirement holds in `items`. A missing item or key
    /// never matches.
    #[must_use]
    pub fn holds_in(&self, items: &BTreeMap<String, PropertyBag>) -> bool {
        self.required.iter().all(|(name, key, value)| {
            items
                .get(name)
                .and_then(|properties| properties.get(key))
                .is_some_and(|current| current == value)
        })
    }

    /// Merge every edit into `items`, creating missing items.
    pub fn apply_to(&self, items: &mut BTreeMap<String, PropertyBag>) {
        for (name, edit) in &self.edits {
            items
                .entry(name.clone())
                .and_modify(|current| current.merge(edit))
                .or_insert_with(|| edit.clone());
        }
    }
}
