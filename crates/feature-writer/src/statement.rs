//! Parameterized statement shapes for the feature table.
//!
//! The table stores each feature in three columns: `jsondata` (jsonb, the
//! feature without geometry), `geo` (PostGIS geometry) and `geojson` (jsonb,
//! the geometry). Parameter order is fixed per shape with the identity and
//! the concurrency token last, so rows of one shape bind positionally:
//!
//! | Shape | Parameters |
//! |---|---|
//! | insert | jsondata, wkb, geojson |
//! | insert-without-geometry | jsondata |
//! | update | jsondata, wkb, geojson, id, [puuid] |
//! | update-without-geometry | jsondata, id, [puuid] |
//! | delete | id, [puuid] |

use crate::error::Operation;
use feature_postgresql_types::WKB_SRID;
use feature_types::NAMESPACE_KEY;

/// Schema-qualified table the writer targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub schema: String,
    pub table: String,
}

impl TableTarget {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// `"schema"."table"` with embedded quotes doubled.
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema),
            quote_identifier(&self.table)
        )
    }
}

impl std::fmt::Display for TableTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// One of the fixed statement forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Insert,
    InsertWithoutGeometry,
    Update { checked: bool },
    UpdateWithoutGeometry { checked: bool },
    Delete { checked: bool },
}

impl Shape {
    /// Number of parameters every bound row of this shape carries.
    pub fn parameter_count(&self) -> usize {
        let token = usize::from(self.is_checked());
        match self {
            Self::Insert => 3,
            Self::InsertWithoutGeometry => 1,
            Self::Update { .. } => 4 + token,
            Self::UpdateWithoutGeometry { .. } => 2 + token,
            Self::Delete { .. } => 1 + token,
        }
    }

    pub fn is_checked(&self) -> bool {
        match self {
            Self::Insert | Self::InsertWithoutGeometry => false,
            Self::Update { checked }
            | Self::UpdateWithoutGeometry { checked }
            | Self::Delete { checked } => *checked,
        }
    }

    /// Whether rows of this shape write the spatial columns.
    pub fn has_geometry(&self) -> bool {
        matches!(self, Self::Insert | Self::Update { .. })
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::Insert | Self::InsertWithoutGeometry => Operation::Insert,
            Self::Update { .. } | Self::UpdateWithoutGeometry { .. } => Operation::Update,
            Self::Delete { .. } => Operation::Delete,
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Insert => "insert",
            Self::InsertWithoutGeometry => "insert-without-geometry",
            Self::Update { .. } => "update",
            Self::UpdateWithoutGeometry { .. } => "update-without-geometry",
            Self::Delete { .. } => "delete",
        };
        if self.is_checked() {
            write!(f, "{name}(checked)")
        } else {
            write!(f, "{name}")
        }
    }
}

/// SQL text of one shape against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStatement {
    shape: Shape,
    sql: String,
}

impl BatchStatement {
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Builds the statement for each shape. Stateless apart from the target.
#[derive(Debug, Clone)]
pub struct StatementBuilder<'a> {
    target: &'a TableTarget,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(target: &'a TableTarget) -> Self {
        Self { target }
    }

    pub fn insert(&self, with_geometry: bool) -> BatchStatement {
        self.build(if with_geometry {
            Shape::Insert
        } else {
            Shape::InsertWithoutGeometry
        })
    }

    pub fn update(&self, with_geometry: bool, checked: bool) -> BatchStatement {
        self.build(if with_geometry {
            Shape::Update { checked }
        } else {
            Shape::UpdateWithoutGeometry { checked }
        })
    }

    pub fn delete(&self, checked: bool) -> BatchStatement {
        self.build(Shape::Delete { checked })
    }

    pub fn build(&self, shape: Shape) -> BatchStatement {
        let table = self.target.qualified_name();
        let geo = |p: usize| format!("ST_Force3D(ST_GeomFromWKB(${p}, {WKB_SRID}))");
        let predicate = |id: usize, checked: bool| {
            let mut clause = format!("jsondata->>'id' = ${id}");
            if checked {
                clause.push_str(&format!(
                    " AND jsondata->'properties'->'{NAMESPACE_KEY}'->>'uuid' = ${}",
                    id + 1
                ));
            }
            clause
        };

        let sql = match shape {
            Shape::Insert => format!(
                "INSERT INTO {table} (jsondata, geo, geojson) VALUES ($1::jsonb, {}, $3::jsonb)",
                geo(2)
            ),
            Shape::InsertWithoutGeometry => {
                format!("INSERT INTO {table} (jsondata) VALUES ($1::jsonb)")
            }
            Shape::Update { checked } => format!(
                "UPDATE {table} SET jsondata = $1::jsonb, geo = {}, geojson = $3::jsonb WHERE {}",
                geo(2),
                predicate(4, checked)
            ),
            Shape::UpdateWithoutGeometry { checked } => format!(
                "UPDATE {table} SET jsondata = $1::jsonb, geo = NULL, geojson = NULL WHERE {}",
                predicate(2, checked)
            ),
            Shape::Delete { checked } => {
                format!("DELETE FROM {table} WHERE {}", predicate(1, checked))
            }
        };

        BatchStatement { shape, sql }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TableTarget {
        TableTarget::new("public", "buildings")
    }

    #[test]
    fn test_qualified_name_quotes_identifiers() {
        assert_eq!(target().qualified_name(), "\"public\".\"buildings\"");
        assert_eq!(
            TableTarget::new("s", "we\"ird").qualified_name(),
            "\"s\".\"we\"\"ird\""
        );
    }

    #[test]
    fn test_insert_statements() {
        let target = target();
        let builder = StatementBuilder::new(&target);

        assert_eq!(
            builder.insert(true).sql(),
            "INSERT INTO \"public\".\"buildings\" (jsondata, geo, geojson) VALUES ($1::jsonb, ST_Force3D(ST_GeomFromWKB($2, 4326)), $3::jsonb)"
        );
        assert_eq!(
            builder.insert(false).sql(),
            "INSERT INTO \"public\".\"buildings\" (jsondata) VALUES ($1::jsonb)"
        );
    }

    #[test]
    fn test_update_statements_place_id_and_token_last() {
        let target = target();
        let builder = StatementBuilder::new(&target);

        assert_eq!(
            builder.update(true, true).sql(),
            "UPDATE \"public\".\"buildings\" SET jsondata = $1::jsonb, geo = ST_Force3D(ST_GeomFromWKB($2, 4326)), geojson = $3::jsonb WHERE jsondata->>'id' = $4 AND jsondata->'properties'->'@ns:com:here:xyz'->>'uuid' = $5"
        );
        assert_eq!(
            builder.update(false, false).sql(),
            "UPDATE \"public\".\"buildings\" SET jsondata = $1::jsonb, geo = NULL, geojson = NULL WHERE jsondata->>'id' = $2"
        );
        assert!(builder
            .update(false, true)
            .sql()
            .ends_with("jsondata->>'id' = $2 AND jsondata->'properties'->'@ns:com:here:xyz'->>'uuid' = $3"));
    }

    #[test]
    fn test_delete_statements() {
        let target = target();
        let builder = StatementBuilder::new(&target);

        assert_eq!(
            builder.delete(false).sql(),
            "DELETE FROM \"public\".\"buildings\" WHERE jsondata->>'id' = $1"
        );
        assert_eq!(
            builder.delete(true).sql(),
            "DELETE FROM \"public\".\"buildings\" WHERE jsondata->>'id' = $1 AND jsondata->'properties'->'@ns:com:here:xyz'->>'uuid' = $2"
        );
    }

    #[test]
    fn test_parameter_count_matches_placeholders() {
        let target = target();
        let builder = StatementBuilder::new(&target);
        let shapes = [
            Shape::Insert,
            Shape::InsertWithoutGeometry,
            Shape::Update { checked: true },
            Shape::Update { checked: false },
            Shape::UpdateWithoutGeometry { checked: true },
            Shape::UpdateWithoutGeometry { checked: false },
            Shape::Delete { checked: true },
            Shape::Delete { checked: false },
        ];

        for shape in shapes {
            let sql = builder.build(shape).sql().to_string();
            let n = shape.parameter_count();
            assert!(sql.contains(&format!("${n}")), "{shape}: {sql}");
            assert!(!sql.contains(&format!("${}", n + 1)), "{shape}: {sql}");
        }
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::Update { checked: true }.to_string(), "update(checked)");
        assert_eq!(
            Shape::UpdateWithoutGeometry { checked: false }.to_string(),
            "update-without-geometry"
        );
        assert_eq!(Shape::InsertWithoutGeometry.to_string(), "insert-without-geometry");
    }
}
