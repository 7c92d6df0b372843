//! GeoJSON feature records.

use crate::extensible::ExtraProperties;
use crate::geometry::Geometry;
use serde::{Deserialize, Serialize};

/// Property key of the reserved namespace object.
pub const NAMESPACE_KEY: &str = "@ns:com:here:xyz";

/// Marker for the GeoJSON `type` member of a feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// A single geospatial record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub kind: FeatureType,

    /// Record identity. Required for update and delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// `None` routes the record through the statements without a spatial column.
    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub properties: Properties,

    #[serde(flatten)]
    pub extra: ExtraProperties,
}

impl Feature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_geometry(mut self, geometry: impl Into<Geometry>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Previous-version token supplied by the caller, if any.
    pub fn previous_uuid(&self) -> Option<&str> {
        self.properties
            .namespace
            .as_ref()
            .and_then(|ns| ns.puuid.as_deref())
    }

    /// Version token this record carries.
    pub fn uuid(&self) -> Option<&str> {
        self.properties
            .namespace
            .as_ref()
            .and_then(|ns| ns.uuid.as_deref())
    }

    /// Mutable access to the namespace, creating it when absent.
    pub fn namespace_mut(&mut self) -> &mut FeatureNamespace {
        self.properties.namespace.get_or_insert_with(Default::default)
    }
}

/// Feature property bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(
        rename = "@ns:com:here:xyz",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub namespace: Option<FeatureNamespace>,

    #[serde(flatten)]
    pub extra: ExtraProperties,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: FeatureNamespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.put(key, value);
        self
    }
}

/// Reserved namespace inside [`Properties`].
///
/// `uuid` is the version token stored with the record; `puuid` is the token
/// the caller last saw and is compared against the stored `uuid` when a
/// concurrency-checked mutation is requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureNamespace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puuid: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(flatten)]
    pub extra: ExtraProperties,
}

impl FeatureNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_puuid(mut self, puuid: impl Into<String>) -> Self {
        self.puuid = Some(puuid.into());
        self
    }
}
