//! Feature collections and per-record modification results.

use crate::extensible::ExtraProperties;
use crate::feature::Feature;
use serde::{Deserialize, Serialize};

/// Marker for the GeoJSON `type` member of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionType {
    #[default]
    FeatureCollection,
}

/// Ordered features plus the failures recorded while writing them.
///
/// Writers append into `features` and `failed` in place, so a caller that
/// hands over `&mut FeatureCollection` keeps a valid handle on the partial
/// result even when the write returns an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: FeatureCollectionType,

    #[serde(default)]
    pub features: Vec<Feature>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<ModificationFailure>,

    #[serde(flatten)]
    pub extra: ExtraProperties,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    /// Take the features out, leaving the collection context (extra members) in place.
    pub fn take_features(&mut self) -> Vec<Feature> {
        std::mem::take(&mut self.features)
    }
}

/// A record that a batch mutation could not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationFailure {
    id: String,
    message: String,
}

impl ModificationFailure {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One identity targeted by a delete, with the token the caller expects it to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDeletion {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_uuid: Option<String>,
}

impl FeatureDeletion {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            previous_uuid: None,
        }
    }

    pub fn with_previous_uuid(mut self, puuid: impl Into<String>) -> Self {
        self.previous_uuid = Some(puuid.into());
        self
    }

    /// Deletions for every feature that carries an id, in input order.
    ///
    /// The token is taken from the feature's namespace `puuid`.
    pub fn from_features<'a>(features: impl IntoIterator<Item = &'a Feature>) -> Vec<Self> {
        features
            .into_iter()
            .filter_map(|f| {
                f.id.as_ref().map(|id| Self {
                    id: id.clone(),
                    previous_uuid: f.previous_uuid().map(str::to_string),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureNamespace, Properties};
    use serde_json::json;

    #[test]
    fn test_collection_serialization_omits_empty_failures() {
        let collection = FeatureCollection::new().with_features(vec![Feature::new().with_id("a")]);
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["type"], json!("FeatureCollection"));
        assert!(value.get("failed").is_none());
    }

    #[test]
    fn test_failure_serialization() {
        let mut collection = FeatureCollection::new();
        collection
            .failed
            .push(ModificationFailure::new("c", "Object does not exist"));
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            value["failed"],
            json!([{"id": "c", "message": "Object does not exist"}])
        );
    }

    #[test]
    fn test_deletions_from_features() {
        let features = vec![
            Feature::new().with_id("a").with_properties(
                Properties::new().with_namespace(FeatureNamespace::new().with_puuid("p1")),
            ),
            Feature::new(),
            Feature::new().with_id("b"),
        ];
        let deletions = FeatureDeletion::from_features(&features);
        assert_eq!(
            deletions,
            vec![
                FeatureDeletion::new("a").with_previous_uuid("p1"),
                FeatureDeletion::new("b"),
            ]
        );
    }
}
