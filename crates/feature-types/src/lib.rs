//! Core types for the feature-store framework.
//!
//! This crate provides the in-memory GeoJSON model that every other crate
//! in the workspace consumes:
//!
//! - [`Feature`] - a single record with identity, geometry and properties
//! - [`Geometry`] / [`Position`] - GeoJSON geometries with optional Z
//! - [`Properties`] / [`FeatureNamespace`] - the property bag and its
//!   reserved namespace carrying version tokens
//! - [`ExtraProperties`] - typed map of forward-compatible members
//! - [`FeatureCollection`] / [`ModificationFailure`] - batch results
//!
//! # Architecture
//!
//! ```text
//! feature-types (this crate)
//!    │
//!    ├─── feature-postgresql-types  (geometry codec, column values)
//!    │
//!    └─── feature-writer            (batch insert/update/delete)
//! ```
//!
//! # Example
//!
//! ```rust
//! use feature_types::{Feature, FeatureCollection, Geometry};
//!
//! let feature = Feature::new()
//!     .with_id("a")
//!     .with_geometry(Geometry::point(1.0, 2.0));
//!
//! let mut collection = FeatureCollection::new();
//! collection.features.push(feature);
//! assert_eq!(collection.features.len(), 1);
//! ```

pub mod collection;
pub mod extensible;
pub mod feature;
pub mod geometry;

pub use collection::{
    FeatureCollection, FeatureCollectionType, FeatureDeletion, ModificationFailure,
};
pub use extensible::ExtraProperties;
pub use feature::{Feature, FeatureNamespace, FeatureType, Properties, NAMESPACE_KEY};
pub use geometry::{Geometry, ModelError, Position};
