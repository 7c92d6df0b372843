//! Forward conversion: Feature → PostgreSQL column values
//!
//! A feature is stored across three columns:
//!
//! - `jsondata` - the feature's GeoJSON without its geometry member
//! - `geo` - 3D WKB of the geometry (see [`crate::wkb`])
//! - `geojson` - the geometry's GeoJSON, kept for inspection
//!
//! Features without geometry only ever produce `jsondata`.

use crate::error::CodecError;
use crate::wkb::encode_wkb;
use feature_types::Feature;
use tokio_postgres::types::ToSql;

/// PostgreSQL value wrapper for the parameters the feature writer binds.
#[derive(Debug, Clone, PartialEq)]
pub enum PostgreSQLValue {
    /// Null value
    Null,
    /// Text value (identities, version tokens)
    Text(String),
    /// Binary data (WKB)
    Bytes(Vec<u8>),
    /// JSON value (bound into jsonb columns)
    Json(serde_json::Value),
}

impl PostgreSQLValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(j) => Some(j),
            _ => None,
        }
    }

    /// Convert into a boxed `ToSql` trait object for `tokio-postgres`.
    pub fn to_boxed(&self) -> Box<dyn ToSql + Sync + Send> {
        match self {
            Self::Null => Box::new(None::<String>),
            Self::Text(s) => Box::new(s.clone()),
            Self::Bytes(b) => Box::new(b.clone()),
            Self::Json(j) => Box::new(j.clone()),
        }
    }
}

impl From<String> for PostgreSQLValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for PostgreSQLValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<u8>> for PostgreSQLValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<serde_json::Value> for PostgreSQLValue {
    fn from(j: serde_json::Value) -> Self {
        Self::Json(j)
    }
}

impl<T: Into<PostgreSQLValue>> From<Option<T>> for PostgreSQLValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Column values for one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumns {
    pub jsondata: serde_json::Value,
    /// Binary geometry; `None` when the feature has no geometry.
    pub wkb: Option<Vec<u8>>,
    /// Structured geometry; `None` when the feature has no geometry.
    pub geojson: Option<serde_json::Value>,
}

impl FeatureColumns {
    /// Encode a feature into its column values.
    pub fn encode(feature: &Feature) -> Result<Self, CodecError> {
        let mut jsondata = serde_json::to_value(feature)?;
        jsondata
            .as_object_mut()
            .ok_or(CodecError::NotAnObject)?
            .remove("geometry");

        let (wkb, geojson) = match &feature.geometry {
            Some(geometry) => (
                Some(encode_wkb(geometry)?),
                Some(serde_json::to_value(geometry)?),
            ),
            None => (None, None),
        };

        Ok(Self {
            jsondata,
            wkb,
            geojson,
        })
    }

    pub fn has_geometry(&self) -> bool {
        self.wkb.is_some()
    }
}
