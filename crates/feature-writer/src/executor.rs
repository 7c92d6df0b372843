//! Batch execution against a store handle.
//!
//! [`BatchExecutor`] is the seam between the writer and the store. The
//! writer hands it one statement and every row bound for that statement;
//! the executor returns one affected-row count per row, in submission order.

use crate::error::WriterError;
use crate::statement::BatchStatement;
use async_trait::async_trait;
use futures::future::try_join_all;
use feature_postgresql_types::PostgreSQLValue;
use tokio_postgres::types::ToSql;
use tokio_postgres::GenericClient;
use tracing::debug;

/// Positional parameters for one row of a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRow {
    params: Vec<PostgreSQLValue>,
}

impl BoundRow {
    pub fn new(params: Vec<PostgreSQLValue>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &[PostgreSQLValue] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Executes one statement for a batch of bound rows.
///
/// Implementations must return exactly one outcome per row, in the order the
/// rows were given. The writer treats any other length as a fatal error.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn execute_batch(
        &self,
        statement: &BatchStatement,
        rows: &[BoundRow],
    ) -> Result<Vec<u64>, WriterError>;
}

/// Executor over a `tokio-postgres` client or transaction.
///
/// The statement is prepared once per batch. All rows are then issued
/// concurrently on the same handle, which `tokio-postgres` pipelines over the
/// one connection; outcomes are collected in submission order.
pub struct PostgresBatchExecutor<'a, C> {
    client: &'a C,
}

impl<'a, C> PostgresBatchExecutor<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a, C> BatchExecutor for PostgresBatchExecutor<'a, C>
where
    C: GenericClient + Sync,
{
    async fn execute_batch(
        &self,
        statement: &BatchStatement,
        rows: &[BoundRow],
    ) -> Result<Vec<u64>, WriterError> {
        debug!("Preparing {}: {}", statement.shape(), statement.sql());
        let prepared = self.client.prepare(statement.sql()).await?;

        let params: Vec<Vec<Box<dyn ToSql + Sync + Send>>> = rows
            .iter()
            .map(|row| row.params().iter().map(PostgreSQLValue::to_boxed).collect())
            .collect();
        let param_refs: Vec<Vec<&(dyn ToSql + Sync)>> = params
            .iter()
            .map(|row| {
                row.iter()
                    .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                    .collect()
            })
            .collect();

        let outcomes = try_join_all(
            param_refs
                .iter()
                .map(|refs| self.client.execute(&prepared, refs.as_slice())),
        )
        .await?;

        Ok(outcomes)
    }
}
