//! PostgreSQL column encodings for feature-types records.
//!
//! This crate turns a [`feature_types::Feature`] into the values bound into
//! the feature table's columns, and wraps those values so they can be passed
//! to `tokio-postgres` as positional parameters.
//!
//! # Modules
//!
//! - [`wkb`] - 3D Well-Known Binary encoding for the spatial column
//! - [`forward`] - Feature → column values (`jsondata`, `geo`, `geojson`)
//!
//! # Example
//!
//! ```ignore
//! use feature_postgresql_types::{FeatureColumns, PostgreSQLValue};
//! use feature_types::{Feature, Geometry};
//!
//! let feature = Feature::new().with_id("a").with_geometry(Geometry::point(1.0, 2.0));
//! let columns = FeatureColumns::encode(&feature)?;
//! assert!(columns.wkb.is_some());
//! let param: PostgreSQLValue = columns.jsondata.into();
//! ```

pub mod error;
pub mod forward;
pub mod wkb;

pub use error::CodecError;
pub use forward::{FeatureColumns, PostgreSQLValue};
pub use wkb::{encode_wkb, WKB_SRID};
