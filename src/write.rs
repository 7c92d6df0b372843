//! One write command run inside one PostgreSQL transaction.

use crate::config::{parse_duration_to_secs, statement_timeout_sql};
use crate::StoreOpts;
use anyhow::Context;
use feature_types::{Feature, FeatureCollection, FeatureDeletion, ModificationFailure};
use feature_writer::{
    BatchExecutor, ConcurrencyCheck, FeatureWriter, PostgresBatchExecutor, TableTarget,
    WritePhase, WriterError,
};
use serde::Serialize;
use tracing::{info, warn};

/// What to write.
#[derive(Debug, Clone)]
pub enum WriteRequest {
    Insert(Vec<Feature>),
    Update {
        features: Vec<Feature>,
        check: ConcurrencyCheck,
    },
    Delete {
        deletions: Vec<FeatureDeletion>,
        check: ConcurrencyCheck,
    },
}

impl WriteRequest {
    fn len(&self) -> usize {
        match self {
            Self::Insert(features) | Self::Update { features, .. } => features.len(),
            Self::Delete { deletions, .. } => deletions.len(),
        }
    }
}

/// What the command prints: the assembled collection for insert and update,
/// the failure list for delete.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WriteOutput {
    Collection(FeatureCollection),
    Failures(Vec<ModificationFailure>),
}

impl WriteOutput {
    pub fn failures(&self) -> &[ModificationFailure] {
        match self {
            Self::Collection(collection) => &collection.failed,
            Self::Failures(failures) => failures,
        }
    }
}

#[derive(Debug)]
pub struct WriteReport {
    pub output: WriteOutput,
    pub phase: WritePhase,
    pub committed: bool,
}

/// Run `request` through `writer` on `executor`.
///
/// The output is returned even when the writer fails, so callers can show
/// which rows were not modified.
pub async fn apply<E>(
    writer: &FeatureWriter,
    executor: &E,
    request: WriteRequest,
) -> (WriteOutput, Result<(), WriterError>)
where
    E: BatchExecutor + ?Sized,
{
    match request {
        WriteRequest::Insert(features) => {
            let mut collection = FeatureCollection::new();
            let result = writer
                .insert_features(executor, &mut collection, features)
                .await;
            (WriteOutput::Collection(collection), result)
        }
        WriteRequest::Update { features, check } => {
            let mut collection = FeatureCollection::new();
            let result = writer
                .update_features(executor, &mut collection, features, check)
                .await;
            (WriteOutput::Collection(collection), result)
        }
        WriteRequest::Delete { deletions, check } => {
            let mut failures = Vec::new();
            let result = writer
                .delete_features(executor, &deletions, &mut failures, check)
                .await;
            (WriteOutput::Failures(failures), result)
        }
    }
}

/// Execute `request` in a new transaction on `client`.
///
/// Commits when the writer succeeds and `dry_run` is off. Rolls back on
/// row-level failures, which are reported through the returned output, and
/// on any other error, which is returned.
pub async fn execute_write(
    client: &mut tokio_postgres::Client,
    opts: &StoreOpts,
    request: WriteRequest,
) -> anyhow::Result<WriteReport> {
    let timeout = opts
        .statement_timeout
        .as_deref()
        .map(parse_duration_to_secs)
        .transpose()
        .context("Invalid --statement-timeout")?;

    let writer = FeatureWriter::new(TableTarget::new(&opts.schema, &opts.table));
    info!(
        "Writing {} rows to {}{}",
        request.len(),
        writer.target(),
        if opts.dry_run { " (dry run)" } else { "" }
    );

    let tx = client
        .transaction()
        .await
        .context("Failed to begin transaction")?;
    if let Some(secs) = timeout {
        tx.batch_execute(&statement_timeout_sql(secs))
            .await
            .context("Failed to set statement timeout")?;
    }

    let executor = PostgresBatchExecutor::new(&tx);
    let (output, result) = apply(&writer, &executor, request).await;
    let phase = WritePhase::terminal(&result);

    match result {
        Ok(()) if !opts.dry_run => {
            tx.commit().await.context("Failed to commit transaction")?;
            Ok(WriteReport {
                output,
                phase,
                committed: true,
            })
        }
        Ok(()) => {
            tx.rollback().await.context("Failed to roll back dry run")?;
            Ok(WriteReport {
                output,
                phase,
                committed: false,
            })
        }
        Err(e) if e.is_modification_failure() => {
            warn!("{e}, rolling back");
            tx.rollback()
                .await
                .context("Failed to roll back transaction")?;
            Ok(WriteReport {
                output,
                phase,
                committed: false,
            })
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!("Rollback after error failed: {rollback}");
            }
            Err(e).with_context(|| format!("Write to {} failed", writer.target()))
        }
    }
}
