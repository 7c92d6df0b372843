//! Well-Known Binary encoding for the spatial column.
//!
//! Output is always three-dimensional so that elevation is never dropped:
//!
//! - Byte order marker `0x00` (big endian)
//! - Geometry type (u32) with the Z flag `0x8000_0000` set
//! - Body; every coordinate is X, Y, Z as f64. A position without Z writes NaN.
//!
//! Multi-geometries and collections repeat the full header for each member.
//! The encoding is a pure function of the geometry, so re-binding the same
//! feature on retry produces identical bytes.

use byteorder::{BigEndian, WriteBytesExt};
use feature_types::{Geometry, Position};
use std::io::Write;

/// Spatial reference the binary form is declared in when bound into SQL.
pub const WKB_SRID: i32 = 4326;

const BIG_ENDIAN: u8 = 0x00;
const Z_FLAG: u32 = 0x8000_0000;

const POINT: u32 = 1;
const LINE_STRING: u32 = 2;
const POLYGON: u32 = 3;
const MULTI_POINT: u32 = 4;
const MULTI_LINE_STRING: u32 = 5;
const MULTI_POLYGON: u32 = 6;
const GEOMETRY_COLLECTION: u32 = 7;

/// Encode a geometry as 3D WKB.
pub fn encode_wkb(geometry: &Geometry) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    write_geometry(&mut buf, geometry)?;
    Ok(buf)
}

fn write_geometry<W: Write>(w: &mut W, geometry: &Geometry) -> std::io::Result<()> {
    match geometry {
        Geometry::Point { coordinates } => {
            write_header(w, POINT)?;
            write_position(w, coordinates)
        }
        Geometry::LineString { coordinates } => {
            write_header(w, LINE_STRING)?;
            write_positions(w, coordinates)
        }
        Geometry::Polygon { coordinates } => {
            write_header(w, POLYGON)?;
            write_rings(w, coordinates)
        }
        Geometry::MultiPoint { coordinates } => {
            write_header(w, MULTI_POINT)?;
            write_count(w, coordinates.len())?;
            for p in coordinates {
                write_header(w, POINT)?;
                write_position(w, p)?;
            }
            Ok(())
        }
        Geometry::MultiLineString { coordinates } => {
            write_header(w, MULTI_LINE_STRING)?;
            write_count(w, coordinates.len())?;
            for line in coordinates {
                write_header(w, LINE_STRING)?;
                write_positions(w, line)?;
            }
            Ok(())
        }
        Geometry::MultiPolygon { coordinates } => {
            write_header(w, MULTI_POLYGON)?;
            write_count(w, coordinates.len())?;
            for rings in coordinates {
                write_header(w, POLYGON)?;
                write_rings(w, rings)?;
            }
            Ok(())
        }
        Geometry::GeometryCollection { geometries } => {
            write_header(w, GEOMETRY_COLLECTION)?;
            write_count(w, geometries.len())?;
            for g in geometries {
                write_geometry(w, g)?;
            }
            Ok(())
        }
    }
}

fn write_header<W: Write>(w: &mut W, type_code: u32) -> std::io::Result<()> {
    w.write_u8(BIG_ENDIAN)?;
    w.write_u32::<BigEndian>(type_code | Z_FLAG)
}

fn write_count<W: Write>(w: &mut W, count: usize) -> std::io::Result<()> {
    let count = u32::try_from(count).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("too many members for WKB: {count}"),
        )
    })?;
    w.write_u32::<BigEndian>(count)
}

fn write_position<W: Write>(w: &mut W, p: &Position) -> std::io::Result<()> {
    w.write_f64::<BigEndian>(p.x)?;
    w.write_f64::<BigEndian>(p.y)?;
    w.write_f64::<BigEndian>(p.z.unwrap_or(f64::NAN))
}

fn write_positions<W: Write>(w: &mut W, positions: &[Position]) -> std::io::Result<()> {
    write_count(w, positions.len())?;
    for p in positions {
        write_position(w, p)?;
    }
    Ok(())
}

fn write_rings<W: Write>(w: &mut W, rings: &[Vec<Position>]) -> std::io::Result<()> {
    write_count(w, rings.len())?;
    for ring in rings {
        write_positions(w, ring)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be(f: f64) -> [u8; 8] {
        f.to_be_bytes()
    }

    #[test]
    fn test_point_without_z() {
        let bytes = encode_wkb(&Geometry::point(1.0, 2.0)).unwrap();

        let mut expected = vec![0x00, 0x80, 0x00, 0x00, 0x01];
        expected.extend_from_slice(&be(1.0));
        expected.extend_from_slice(&be(2.0));
        expected.extend_from_slice(&be(f64::NAN));
        assert_eq!(bytes, expected);
        assert!(f64::from_be_bytes(bytes[21..29].try_into().unwrap()).is_nan());
    }

    #[test]
    fn test_point_with_z() {
        let bytes = encode_wkb(&Geometry::point_z(1.0, 2.0, 3.5)).unwrap();
        assert_eq!(bytes.len(), 5 + 24);
        assert_eq!(&bytes[21..29], &be(3.5));
    }

    #[test]
    fn test_polygon_layout() {
        let ring = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(0.0, 0.0),
        ];
        let bytes = encode_wkb(&Geometry::Polygon {
            coordinates: vec![ring],
        })
        .unwrap();

        // header + ring count + point count + 4 XYZ points
        assert_eq!(bytes.len(), 5 + 4 + 4 + 4 * 24);
        assert_eq!(&bytes[1..5], &[0x80, 0, 0, 0x03]);
        assert_eq!(&bytes[5..9], &1u32.to_be_bytes());
        assert_eq!(&bytes[9..13], &4u32.to_be_bytes());
    }

    #[test]
    fn test_multi_point_members_have_headers() {
        let bytes = encode_wkb(&Geometry::MultiPoint {
            coordinates: vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0)],
        })
        .unwrap();

        assert_eq!(bytes.len(), 5 + 4 + 2 * (5 + 24));
        assert_eq!(&bytes[9..14], &[0x00, 0x80, 0, 0, 0x01]);
    }

    #[test]
    fn test_collection_nests_geometries() {
        let bytes = encode_wkb(&Geometry::GeometryCollection {
            geometries: vec![Geometry::point(0.0, 0.0), Geometry::point_z(1.0, 1.0, 1.0)],
        })
        .unwrap();

        assert_eq!(&bytes[1..5], &[0x80, 0, 0, 0x07]);
        assert_eq!(bytes.len(), 5 + 4 + 2 * 29);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let geometry = Geometry::LineString {
            coordinates: vec![Position::new(0.5, 1.5), Position::with_z(2.0, 3.0, 4.0)],
        };
        assert_eq!(encode_wkb(&geometry).unwrap(), encode_wkb(&geometry).unwrap());
    }
}
