//! Batch insert, update and delete of features.

use crate::concurrency::ConcurrencyCheck;
use crate::error::{Operation, WriterError};
use crate::executor::{BatchExecutor, BoundRow};
use crate::failure::{verify_outcome_count, FailureAggregator};
use crate::statement::{BatchStatement, Shape, StatementBuilder, TableTarget};
use feature_postgresql_types::{FeatureColumns, PostgreSQLValue};
use feature_types::{Feature, FeatureCollection, FeatureDeletion, ModificationFailure};
use std::collections::HashMap;
use tracing::{debug, info};

/// Lifecycle of one writer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    /// Grouping rows by shape.
    Collecting,
    /// Running each non-empty shape batch.
    Executing,
    /// Reconciling outcomes with identities.
    Aggregating,
    Succeeded,
    /// Row failures were recorded and escalated.
    Failed,
    /// Validation or execution aborted the call.
    Errored,
}

impl WritePhase {
    /// Terminal phase a call ended in.
    pub fn terminal(result: &Result<(), WriterError>) -> Self {
        match result {
            Ok(()) => Self::Succeeded,
            Err(e) if e.is_modification_failure() => Self::Failed,
            Err(_) => Self::Errored,
        }
    }
}

impl std::fmt::Display for WritePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Collecting => "collecting",
            Self::Executing => "executing",
            Self::Aggregating => "aggregating",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Errored => "errored",
        };
        write!(f, "{name}")
    }
}

/// Rows bound for one shape plus the identity of each row, in submission order.
struct ShapeBatch {
    statement: BatchStatement,
    ids: Vec<String>,
    rows: Vec<BoundRow>,
}

impl ShapeBatch {
    fn new(statement: BatchStatement) -> Self {
        Self {
            statement,
            ids: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, id: String, row: BoundRow) -> Result<(), WriterError> {
        let shape = self.statement.shape();
        if row.len() != shape.parameter_count() {
            return Err(WriterError::ParameterCount {
                shape,
                expected: shape.parameter_count(),
                actual: row.len(),
            });
        }
        self.ids.push(id);
        self.rows.push(row);
        Ok(())
    }
}

/// Shape batches of one call, executed in the order the shapes were declared.
struct ShapeGroups<'a> {
    builder: StatementBuilder<'a>,
    batches: Vec<ShapeBatch>,
}

impl<'a> ShapeGroups<'a> {
    fn new(builder: StatementBuilder<'a>, shapes: &[Shape]) -> Self {
        let batches = shapes
            .iter()
            .map(|shape| ShapeBatch::new(builder.build(*shape)))
            .collect();
        Self { builder, batches }
    }

    fn push(&mut self, shape: Shape, id: String, row: BoundRow) -> Result<(), WriterError> {
        let index = match self
            .batches
            .iter()
            .position(|b| b.statement.shape() == shape)
        {
            Some(index) => index,
            None => {
                self.batches.push(ShapeBatch::new(self.builder.build(shape)));
                self.batches.len() - 1
            }
        };
        self.batches[index].push(id, row)
    }

    fn non_empty(&self) -> impl Iterator<Item = &ShapeBatch> {
        self.batches.iter().filter(|b| !b.rows.is_empty())
    }
}

/// One deletion per identity, in first-seen order. A repeated identity keeps
/// its first position and takes the token of its last occurrence.
fn unique_deletions(deletions: &[FeatureDeletion]) -> Vec<&FeatureDeletion> {
    let mut unique: Vec<&FeatureDeletion> = Vec::with_capacity(deletions.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(deletions.len());
    for deletion in deletions {
        match index.get(deletion.id.as_str()) {
            Some(&i) => unique[i] = deletion,
            None => {
                index.insert(deletion.id.as_str(), unique.len());
                unique.push(deletion);
            }
        }
    }
    unique
}

/// Writes feature batches into one table.
///
/// The writer holds no state between calls; every call runs against the
/// executor it is given.
#[derive(Debug, Clone)]
pub struct FeatureWriter {
    target: TableTarget,
}

impl FeatureWriter {
    pub fn new(target: TableTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &TableTarget {
        &self.target
    }

    /// Insert `inserts` and append each of them to `collection`.
    ///
    /// Features without geometry never populate the spatial columns. Insert
    /// has no zero-row failure mode: a row either creates a record or the
    /// batch errors.
    pub async fn insert_features<E>(
        &self,
        executor: &E,
        collection: &mut FeatureCollection,
        inserts: Vec<Feature>,
    ) -> Result<(), WriterError>
    where
        E: BatchExecutor + ?Sized,
    {
        let result = self.run_insert(executor, collection, inserts).await;
        self.finish(Operation::Insert, &result);
        result
    }

    /// Update `updates` and append each of them to `collection`.
    ///
    /// Rows that matched nothing are recorded in `collection.failed`; if that
    /// list is non-empty afterwards the call returns
    /// [`WriterError::ModificationFailed`] with the collection still populated.
    pub async fn update_features<E>(
        &self,
        executor: &E,
        collection: &mut FeatureCollection,
        updates: Vec<Feature>,
        check: ConcurrencyCheck,
    ) -> Result<(), WriterError>
    where
        E: BatchExecutor + ?Sized,
    {
        let result = self.run_update(executor, collection, updates, check).await;
        self.finish(Operation::Update, &result);
        result
    }

    /// Delete every identity in `deletions`, recording misses in `failures`.
    ///
    /// Geometry plays no part in deletes. An identity listed more than once is
    /// deleted once, with the token of its last occurrence. A non-empty
    /// `failures` list after aggregation returns
    /// [`WriterError::ModificationFailed`].
    pub async fn delete_features<E>(
        &self,
        executor: &E,
        deletions: &[FeatureDeletion],
        failures: &mut Vec<ModificationFailure>,
        check: ConcurrencyCheck,
    ) -> Result<(), WriterError>
    where
        E: BatchExecutor + ?Sized,
    {
        let result = self.run_delete(executor, deletions, failures, check).await;
        self.finish(Operation::Delete, &result);
        result
    }

    async fn run_insert<E>(
        &self,
        executor: &E,
        collection: &mut FeatureCollection,
        inserts: Vec<Feature>,
    ) -> Result<(), WriterError>
    where
        E: BatchExecutor + ?Sized,
    {
        self.enter(Operation::Insert, WritePhase::Collecting);
        let mut groups = ShapeGroups::new(
            StatementBuilder::new(&self.target),
            &[Shape::Insert, Shape::InsertWithoutGeometry],
        );

        for feature in inserts {
            let columns = FeatureColumns::encode(&feature)?;
            let id = feature.id.clone().unwrap_or_default();
            let (shape, row) = match (columns.wkb, columns.geojson) {
                (Some(wkb), Some(geojson)) => (
                    Shape::Insert,
                    BoundRow::new(vec![columns.jsondata.into(), wkb.into(), geojson.into()]),
                ),
                _ => (
                    Shape::InsertWithoutGeometry,
                    BoundRow::new(vec![columns.jsondata.into()]),
                ),
            };
            groups.push(shape, id, row)?;
            collection.features.push(feature);
        }

        self.enter(Operation::Insert, WritePhase::Executing);
        for batch in groups.non_empty() {
            let outcomes = self.execute(executor, batch).await?;
            verify_outcome_count(
                Operation::Insert,
                batch.statement.shape(),
                batch.rows.len(),
                outcomes.len(),
            )?;
        }
        Ok(())
    }

    async fn run_update<E>(
        &self,
        executor: &E,
        collection: &mut FeatureCollection,
        updates: Vec<Feature>,
        check: ConcurrencyCheck,
    ) -> Result<(), WriterError>
    where
        E: BatchExecutor + ?Sized,
    {
        self.enter(Operation::Update, WritePhase::Collecting);
        let mut groups = ShapeGroups::new(
            StatementBuilder::new(&self.target),
            &[
                Shape::Update { checked: true },
                Shape::Update { checked: false },
                Shape::UpdateWithoutGeometry { checked: true },
                Shape::UpdateWithoutGeometry { checked: false },
            ],
        );

        for (position, feature) in updates.into_iter().enumerate() {
            let id = feature
                .id
                .clone()
                .ok_or(WriterError::MissingId { position })?;
            let token = check.token_for(feature.previous_uuid()).map(str::to_string);
            let checked = token.is_some();
            let columns = FeatureColumns::encode(&feature)?;

            let mut params: Vec<PostgreSQLValue> = vec![columns.jsondata.into()];
            let shape = match (columns.wkb, columns.geojson) {
                (Some(wkb), Some(geojson)) => {
                    params.push(wkb.into());
                    params.push(geojson.into());
                    Shape::Update { checked }
                }
                _ => Shape::UpdateWithoutGeometry { checked },
            };
            params.push(id.clone().into());
            if let Some(token) = token {
                params.push(token.into());
            }

            groups.push(shape, id, BoundRow::new(params))?;
            collection.features.push(feature);
        }

        let aggregator = FailureAggregator::new(Operation::Update, check);
        self.execute_and_aggregate(executor, &groups, &aggregator, &mut collection.failed)
            .await?;
        aggregator.escalate(&collection.failed)
    }

    async fn run_delete<E>(
        &self,
        executor: &E,
        deletions: &[FeatureDeletion],
        failures: &mut Vec<ModificationFailure>,
        check: ConcurrencyCheck,
    ) -> Result<(), WriterError>
    where
        E: BatchExecutor + ?Sized,
    {
        self.enter(Operation::Delete, WritePhase::Collecting);
        let mut groups = ShapeGroups::new(
            StatementBuilder::new(&self.target),
            &[Shape::Delete { checked: true }, Shape::Delete { checked: false }],
        );

        for (position, deletion) in deletions.iter().enumerate() {
            if deletion.id.is_empty() {
                return Err(WriterError::MissingId { position });
            }
        }

        for deletion in unique_deletions(deletions) {
            let token = check.token_for(deletion.previous_uuid.as_deref());

            let mut params: Vec<PostgreSQLValue> = vec![deletion.id.as_str().into()];
            if let Some(token) = token {
                params.push(token.into());
            }
            groups.push(
                Shape::Delete {
                    checked: token.is_some(),
                },
                deletion.id.clone(),
                BoundRow::new(params),
            )?;
        }

        let aggregator = FailureAggregator::new(Operation::Delete, check);
        self.execute_and_aggregate(executor, &groups, &aggregator, failures)
            .await?;
        aggregator.escalate(failures)
    }

    async fn execute_and_aggregate<E>(
        &self,
        executor: &E,
        groups: &ShapeGroups<'_>,
        aggregator: &FailureAggregator,
        failures: &mut Vec<ModificationFailure>,
    ) -> Result<(), WriterError>
    where
        E: BatchExecutor + ?Sized,
    {
        for batch in groups.non_empty() {
            let operation = batch.statement.shape().operation();
            self.enter(operation, WritePhase::Executing);
            let outcomes = self.execute(executor, batch).await?;

            self.enter(operation, WritePhase::Aggregating);
            let added = aggregator.reconcile(
                batch.statement.shape(),
                &batch.ids,
                &outcomes,
                failures,
            )?;
            if added > 0 {
                debug!(
                    "{} of {} rows not applied for {}",
                    added,
                    batch.rows.len(),
                    batch.statement.shape()
                );
            }
        }
        Ok(())
    }

    async fn execute<E>(&self, executor: &E, batch: &ShapeBatch) -> Result<Vec<u64>, WriterError>
    where
        E: BatchExecutor + ?Sized,
    {
        debug!(
            "Executing {} batch of {} rows on {}",
            batch.statement.shape(),
            batch.rows.len(),
            self.target
        );
        executor.execute_batch(&batch.statement, &batch.rows).await
    }

    fn enter(&self, operation: Operation, phase: WritePhase) {
        debug!("{} on {}: {}", operation, self.target, phase);
    }

    fn finish(&self, operation: Operation, result: &Result<(), WriterError>) {
        let phase = WritePhase::terminal(result);
        match result {
            Ok(()) => info!("{} on {} {}", operation, self.target, phase),
            Err(e) => debug!("{} on {} {}: {}", operation, self.target, phase, e),
        }
    }
}
