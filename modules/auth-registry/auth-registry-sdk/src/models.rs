//! Domain models for the `auth_registry` module.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved property: position of the item in the global priority sequence.
pub const ORDER_KEY: &str = "order";

/// Reserved property: whether the item takes part in the chains.
pub const ENABLED_KEY: &str = "enabled";

/// Reserved property: name of the identity-source factory that builds the item.
pub const TYPE_KEY: &str = "type";

const RESERVED_KEYS: [&str; 3] = [ORDER_KEY, ENABLED_KEY, TYPE_KEY];

/// Opaque key/value configuration block of a single configuration item.
///
/// Only `order`, `enabled` and `type` carry meaning for the registry; every
/// other key belongs to the identity source that the item configures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(Map<String, Value>);

impl PropertyBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// The item's `order`, if present and integral.
    #[must_use]
    pub fn order(&self) -> Option<i64> {
        self.0.get(ORDER_KEY).and_then(Value::as_i64)
    }

    /// Sets `order`; `None` stores an explicit null.
    pub fn set_order(&mut self, order: Option<i64>) {
        self.0
            .insert(ORDER_KEY.to_owned(), order.map_or(Value::Null, Value::from));
    }

    /// The item's `enabled` flag. Items without the key are enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.0
            .get(ENABLED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.0.insert(ENABLED_KEY.to_owned(), Value::Bool(enabled));
    }

    /// The identity-source kind declared by the item.
    #[must_use]
    pub fn source_type(&self) -> Option<&str> {
        self.0.get(TYPE_KEY).and_then(Value::as_str)
    }

    /// Overwrites this bag's keys with the keys of `other`.
    pub fn merge(&mut self, other: &PropertyBag) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// A copy of the bag without the registry's reserved keys.
    #[must_use]
    pub fn without_reserved(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for PropertyBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The capability a catalog entry exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Verifies credentials.
    AuthenticationProvider,
    /// Resolves user details by username.
    UserLookupService,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationProvider => f.write_str("AuthenticationProvider"),
            Self::UserLookupService => f.write_str("UserLookupService"),
        }
    }
}

/// Operator-facing view of one catalog entry and its persisted configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationItem {
    pub name: String,
    pub kind: ItemKind,
    pub order: Option<i64>,
    pub enabled: bool,
    pub properties: PropertyBag,
}

impl AuthenticationItem {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ItemKind, properties: PropertyBag) -> Self {
        Self {
            name: name.into(),
            kind,
            order: properties.order(),
            enabled: properties.enabled(),
            properties,
        }
    }
}

/// Priority and enablement edit for a single item, as sent by operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationItemUpdate {
    pub name: String,
    pub order: Option<i64>,
    #[serde(default)]
    pub enabled: bool,
}

impl AuthenticationItemUpdate {
    #[must_use]
    pub fn new(name: impl Into<String>, order: i64, enabled: bool) -> Self {
        Self {
            name: name.into(),
            order: Some(order),
            enabled,
        }
    }
}

/// User details as returned by a lookup service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
    pub username: String,
    /// Never serialized. Wrapped so `Debug` redacts it.
    #[serde(skip)]
    pub password: Option<SecretString>,
    pub enabled: bool,
    pub roles: BTreeSet<String>,
}

impl UserDetails {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            enabled: true,
            roles: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<SecretString>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A user record held by the external-user cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedUser {
    pub username: String,
    /// Lookup service that produced the record; blank for locally managed users.
    pub source_id: String,
    pub last_update: DateTime<Utc>,
    pub details: UserDetails,
}

impl CachedUser {
    /// `true` when the record came from an external lookup service.
    #[must_use]
    pub fn is_external(&self) -> bool {
        !self.source_id.trim().is_empty()
    }
}

/// Username/password pair presented for verification.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Result of a successful credential verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    pub username: String,
    /// Name of the configuration item whose provider accepted the credentials.
    pub provider: String,
    pub roles: BTreeSet<String>,
}
