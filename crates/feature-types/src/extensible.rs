//! Typed map for members that have no dedicated field.
//!
//! GeoJSON producers attach arbitrary members to features, property bags and
//! namespaces. [`ExtraProperties`] keeps them verbatim so a record survives a
//! read/modify/write cycle without losing fields this crate does not model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unmodelled JSON members, flattened into their owner on (de)serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraProperties(Map<String, Value>);

impl ExtraProperties {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value stored under `key`, deserialized into `T`.
    ///
    /// Returns `None` when the key is absent or holds a value of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Store `value` under `key`, returning the previous value if any.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder form of [`put`](Self::put).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Copy every member of `other` into `self`. Members of `other` win.
    pub fn merge(&mut self, other: ExtraProperties) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for ExtraProperties {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<ExtraProperties> for Map<String, Value> {
    fn from(extra: ExtraProperties) -> Self {
        extra.0
    }
}
