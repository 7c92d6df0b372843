//! In-memory store for exercising the writer without a database.
//!
//! [`MemoryStore`] interprets each [`Shape`] with the same positional
//! parameters and equality predicates the SQL statements use, so grouping,
//! parameter order and outcome reconciliation can be tested end to end.
//! Faults can be queued against a shape to make its next batch error or
//! return a short outcome list.

use crate::error::WriterError;
use crate::executor::{BatchExecutor, BoundRow};
use crate::statement::{BatchStatement, Shape};
use async_trait::async_trait;
use feature_postgresql_types::PostgreSQLValue;
use feature_types::NAMESPACE_KEY;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// One row of the in-memory feature table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub jsondata: Value,
    pub geo: Option<Vec<u8>>,
    pub geojson: Option<Value>,
}

impl StoredRow {
    pub fn id(&self) -> Option<&str> {
        self.jsondata.get("id").and_then(Value::as_str)
    }

    /// Stored version token, `jsondata.properties[namespace].uuid`.
    pub fn uuid(&self) -> Option<&str> {
        self.jsondata
            .get("properties")
            .and_then(|p| p.get(NAMESPACE_KEY))
            .and_then(|ns| ns.get("uuid"))
            .and_then(Value::as_str)
    }

    fn matches(&self, id: &str, token: Option<&str>) -> bool {
        // SQL equality against NULL never matches, so a missing stored uuid
        // fails a checked predicate.
        self.id() == Some(id)
            && match token {
                Some(token) => self.uuid() == Some(token),
                None => true,
            }
    }
}

/// Fault applied to the next batch of a given shape.
#[derive(Debug, Clone)]
pub enum Fault {
    /// The batch fails with a store-level error and changes nothing.
    Error(String),
    /// The batch is applied but its last outcome is dropped.
    DropLastOutcome,
}

/// A batch the store received.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedBatch {
    pub shape: Shape,
    pub rows: usize,
}

/// In-memory [`BatchExecutor`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredRow>>,
    faults: Mutex<VecDeque<(Shape, Fault)>>,
    executed: Mutex<Vec<ExecutedBatch>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fault for the next batch of `shape`. Faults for the same
    /// shape apply in FIFO order.
    pub async fn inject(&self, shape: Shape, fault: Fault) {
        self.faults.lock().await.push_back((shape, fault));
    }

    pub async fn rows(&self) -> Vec<StoredRow> {
        self.rows.lock().await.clone()
    }

    pub async fn row(&self, id: &str) -> Option<StoredRow> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|r| r.id() == Some(id))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Batches executed so far, in execution order.
    pub async fn executed(&self) -> Vec<ExecutedBatch> {
        self.executed.lock().await.clone()
    }
}

#[async_trait]
impl BatchExecutor for MemoryStore {
    async fn execute_batch(
        &self,
        statement: &BatchStatement,
        rows: &[BoundRow],
    ) -> Result<Vec<u64>, WriterError> {
        let shape = statement.shape();
        let fault = {
            let mut faults = self.faults.lock().await;
            faults
                .iter()
                .position(|(s, _)| *s == shape)
                .and_then(|i| faults.remove(i))
                .map(|(_, fault)| fault)
        };
        if let Some(Fault::Error(message)) = &fault {
            return Err(WriterError::Execution(message.clone()));
        }

        let mut table = self.rows.lock().await;
        let mut outcomes = Vec::with_capacity(rows.len());
        for row in rows {
            let p = row.params();
            if p.len() != shape.parameter_count() {
                return Err(WriterError::Execution(format!(
                    "{shape} bound with {} parameters",
                    p.len()
                )));
            }

            let affected = match shape {
                Shape::Insert => {
                    table.push(StoredRow {
                        jsondata: json(&p[0])?,
                        geo: Some(bytes(&p[1])?),
                        geojson: Some(json(&p[2])?),
                    });
                    1
                }
                Shape::InsertWithoutGeometry => {
                    table.push(StoredRow {
                        jsondata: json(&p[0])?,
                        geo: None,
                        geojson: None,
                    });
                    1
                }
                Shape::Update { checked } => {
                    let token = if checked { Some(text(&p[4])?) } else { None };
                    let replacement = StoredRow {
                        jsondata: json(&p[0])?,
                        geo: Some(bytes(&p[1])?),
                        geojson: Some(json(&p[2])?),
                    };
                    replace_matching(&mut table, text(&p[3])?, token, &replacement)
                }
                Shape::UpdateWithoutGeometry { checked } => {
                    let token = if checked { Some(text(&p[2])?) } else { None };
                    let replacement = StoredRow {
                        jsondata: json(&p[0])?,
                        geo: None,
                        geojson: None,
                    };
                    replace_matching(&mut table, text(&p[1])?, token, &replacement)
                }
                Shape::Delete { checked } => {
                    let id = text(&p[0])?;
                    let token = if checked { Some(text(&p[1])?) } else { None };
                    let before = table.len();
                    table.retain(|r| !r.matches(id, token));
                    (before - table.len()) as u64
                }
            };
            outcomes.push(affected);
        }

        self.executed.lock().await.push(ExecutedBatch {
            shape,
            rows: rows.len(),
        });

        if matches!(fault, Some(Fault::DropLastOutcome)) {
            outcomes.pop();
        }
        Ok(outcomes)
    }
}

fn replace_matching(
    table: &mut [StoredRow],
    id: &str,
    token: Option<&str>,
    replacement: &StoredRow,
) -> u64 {
    let mut affected = 0;
    for row in table.iter_mut().filter(|r| r.matches(id, token)) {
        *row = replacement.clone();
        affected += 1;
    }
    affected
}

fn text(value: &PostgreSQLValue) -> Result<&str, WriterError> {
    value
        .as_text()
        .ok_or_else(|| WriterError::Execution(format!("expected text parameter, got {value:?}")))
}

fn bytes(value: &PostgreSQLValue) -> Result<Vec<u8>, WriterError> {
    value
        .as_bytes()
        .map(<[u8]>::to_vec)
        .ok_or_else(|| WriterError::Execution(format!("expected bytea parameter, got {value:?}")))
}

fn json(value: &PostgreSQLValue) -> Result<Value, WriterError> {
    value
        .as_json()
        .cloned()
        .ok_or_else(|| WriterError::Execution(format!("expected jsonb parameter, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{StatementBuilder, TableTarget};
    use serde_json::json;

    fn jsondata(id: &str, uuid: &str) -> PostgreSQLValue {
        PostgreSQLValue::Json(json!({
            "type": "Feature",
            "id": id,
            "properties": {NAMESPACE_KEY: {"uuid": uuid}}
        }))
    }

    #[tokio::test]
    async fn test_checked_update_requires_matching_uuid() {
        let target = TableTarget::new("public", "t");
        let builder = StatementBuilder::new(&target);
        let store = MemoryStore::new();

        store
            .execute_batch(&builder.insert(false), &[BoundRow::new(vec![jsondata("a", "u1")])])
            .await
            .unwrap();

        let update = builder.update(false, true);
        let stale = BoundRow::new(vec![jsondata("a", "u3"), "a".into(), "u0".into()]);
        assert_eq!(store.execute_batch(&update, &[stale]).await.unwrap(), vec![0]);

        let fresh = BoundRow::new(vec![jsondata("a", "u2"), "a".into(), "u1".into()]);
        assert_eq!(store.execute_batch(&update, &[fresh]).await.unwrap(), vec![1]);
        assert_eq!(store.row("a").await.unwrap().uuid(), Some("u2"));
    }

    #[tokio::test]
    async fn test_error_fault_leaves_table_untouched() {
        let target = TableTarget::new("public", "t");
        let builder = StatementBuilder::new(&target);
        let store = MemoryStore::new();
        store
            .inject(Shape::InsertWithoutGeometry, Fault::Error("boom".to_string()))
            .await;

        let err = store
            .execute_batch(&builder.insert(false), &[BoundRow::new(vec![jsondata("a", "u1")])])
            .await
            .unwrap_err();

        assert!(matches!(err, WriterError::Execution(ref m) if m == "boom"));
        assert!(store.is_empty().await);
        assert!(store.executed().await.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_parameter_type_is_rejected() {
        let target = TableTarget::new("public", "t");
        let builder = StatementBuilder::new(&target);
        let store = MemoryStore::new();

        let err = store
            .execute_batch(&builder.delete(false), &[BoundRow::new(vec![PostgreSQLValue::Null])])
            .await
            .unwrap_err();
        assert!(matches!(err, WriterError::Execution(_)));
    }
}
