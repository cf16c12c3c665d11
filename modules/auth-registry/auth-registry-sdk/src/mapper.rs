//! Typed access to a single configuration item.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AuthRegistryError;
use crate::models::PropertyBag;

/// Maps a typed configuration object to and from one item's property bag.
pub trait CustomItemMapper<T>: Send + Sync {
    /// Name of the configuration item this mapper owns.
    fn item_id(&self) -> &str;

    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if `value` cannot be represented as properties.
    fn to_properties(&self, value: &T) -> Result<PropertyBag, AuthRegistryError>;

    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if the stored properties do not describe a `T`.
    fn from_properties(&self, properties: &PropertyBag) -> Result<T, AuthRegistryError>;
}

/// [`CustomItemMapper`] backed by `serde_json`.
pub struct SerdeItemMapper<T> {
    item_id: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeItemMapper<T> {
    #[must_use]
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            _marker: PhantomData,
        }
    }
}

impl<T> CustomItemMapper<T> for SerdeItemMapper<T>
where
    T: Serialize + DeserializeOwned,
{
    fn item_id(&self) -> &str {
        &self.item_id
    }

    fn to_properties(&self, value: &T) -> Result<PropertyBag, AuthRegistryError> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::Object(map)) => Ok(PropertyBag::from(map)),
            Ok(other) => Err(AuthRegistryError::configuration_invalid(
                &self.item_id,
                format!("expected an object, got {other}"),
            )),
            Err(e) => Err(AuthRegistryError::configuration_invalid(
                &self.item_id,
                e.to_string(),
            )),
        }
    }

    fn from_properties(&self, properties: &PropertyBag) -> Result<T, AuthRegistryError> {
        serde_json::from_value(serde_json::Value::Object(properties.as_map().clone()))
            .map_err(|e| AuthRegistryError::configuration_invalid(&self.item_id, e.to_string()))
    }
}
