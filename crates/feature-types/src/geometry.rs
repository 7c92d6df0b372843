//! GeoJSON geometry representation.
//!
//! Positions keep an optional third ordinate so elevation survives the trip
//! into the spatial column; `geo_types` is 2D only, so values coming from it
//! always carry `z: None`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while materializing model values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A position must hold two or three ordinates.
    #[error("Invalid position: expected 2 or 3 ordinates, got {0}")]
    InvalidPosition(usize),
}

/// A single coordinate. Serialized as `[x, y]` or `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = ModelError;

    fn try_from(ordinates: Vec<f64>) -> Result<Self, Self::Error> {
        match ordinates.as_slice() {
            [x, y] => Ok(Self::new(*x, *y)),
            [x, y, z] => Ok(Self::with_z(*x, *y, *z)),
            other => Err(ModelError::InvalidPosition(other.len())),
        }
    }
}

impl From<Position> for Vec<f64> {
    fn from(p: Position) -> Self {
        match p.z {
            Some(z) => vec![p.x, p.y, z],
            None => vec![p.x, p.y],
        }
    }
}

/// GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    /// Exterior ring first, then holes.
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    /// Create a 2D point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::Point {
            coordinates: Position::new(x, y),
        }
    }

    /// Create a 3D point.
    pub fn point_z(x: f64, y: f64, z: f64) -> Self {
        Self::Point {
            coordinates: Position::with_z(x, y, z),
        }
    }

    /// The GeoJSON `type` member of this geometry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point { .. } => "Point",
            Self::MultiPoint { .. } => "MultiPoint",
            Self::LineString { .. } => "LineString",
            Self::MultiLineString { .. } => "MultiLineString",
            Self::Polygon { .. } => "Polygon",
            Self::MultiPolygon { .. } => "MultiPolygon",
            Self::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}

// geo-types interop

impl From<geo_types::Coord<f64>> for Position {
    fn from(c: geo_types::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

fn line_string_positions(ls: geo_types::LineString<f64>) -> Vec<Position> {
    ls.0.into_iter().map(Position::from).collect()
}

fn polygon_rings(polygon: geo_types::Polygon<f64>) -> Vec<Vec<Position>> {
    let (exterior, interiors) = polygon.into_inner();
    let mut rings = Vec::with_capacity(interiors.len() + 1);
    rings.push(line_string_positions(exterior));
    rings.extend(interiors.into_iter().map(line_string_positions));
    rings
}

impl From<geo_types::Point<f64>> for Geometry {
    fn from(p: geo_types::Point<f64>) -> Self {
        Self::Point {
            coordinates: p.0.into(),
        }
    }
}

impl From<geo_types::LineString<f64>> for Geometry {
    fn from(ls: geo_types::LineString<f64>) -> Self {
        Self::LineString {
            coordinates: line_string_positions(ls),
        }
    }
}

impl From<geo_types::Polygon<f64>> for Geometry {
    fn from(polygon: geo_types::Polygon<f64>) -> Self {
        Self::Polygon {
            coordinates: polygon_rings(polygon),
        }
    }
}

impl From<geo_types::Geometry<f64>> for Geometry {
    fn from(geometry: geo_types::Geometry<f64>) -> Self {
        use geo_types::Geometry as G;
        match geometry {
            G::Point(p) => p.into(),
            G::Line(line) => Self::LineString {
                coordinates: vec![line.start.into(), line.end.into()],
            },
            G::LineString(ls) => ls.into(),
            G::Polygon(polygon) => polygon.into(),
            G::MultiPoint(mp) => Self::MultiPoint {
                coordinates: mp.0.into_iter().map(|p| p.0.into()).collect(),
            },
            G::MultiLineString(mls) => Self::MultiLineString {
                coordinates: mls.0.into_iter().map(line_string_positions).collect(),
            },
            G::MultiPolygon(mp) => Self::MultiPolygon {
                coordinates: mp.0.into_iter().map(polygon_rings).collect(),
            },
            G::GeometryCollection(gc) => Self::GeometryCollection {
                geometries: gc.0.into_iter().map(Geometry::from).collect(),
            },
            G::Rect(rect) => rect.to_polygon().into(),
            G::Triangle(triangle) => triangle.to_polygon().into(),
        }
    }
}
