//! Batched feature writes with optimistic concurrency.
//!
//! The writer commits ordered feature lists into a PostgreSQL/PostGIS table
//! through one caller-owned connection or transaction. Each call:
//!
//! 1. groups records by statement [`Shape`] (geometry present or not,
//!    concurrency-checked or not),
//! 2. executes every non-empty group as one batch,
//! 3. reconciles per-row affected counts back to record identities, turning
//!    zero-row outcomes into [`ModificationFailure`](feature_types::ModificationFailure)s,
//! 4. escalates a non-empty failure list on update and delete into
//!    [`WriterError::ModificationFailed`].
//!
//! The writer never begins, commits or rolls back. Groups already executed
//! stay applied when a later group errors unless the caller rolls back.
//!
//! # Example
//!
//! ```ignore
//! use feature_writer::{ConcurrencyCheck, FeatureWriter, PostgresBatchExecutor, TableTarget};
//!
//! let tx = client.transaction().await?;
//! let writer = FeatureWriter::new(TableTarget::new("public", "buildings"));
//! let executor = PostgresBatchExecutor::new(&tx);
//! writer
//!     .update_features(&executor, &mut collection, updates, ConcurrencyCheck::enabled())
//!     .await?;
//! tx.commit().await?;
//! ```

pub mod concurrency;
pub mod error;
pub mod executor;
pub mod failure;
pub mod statement;
pub mod testing;
mod writer;

pub use concurrency::ConcurrencyCheck;
pub use error::{Operation, WriterError};
pub use executor::{BatchExecutor, BoundRow, PostgresBatchExecutor};
pub use failure::{FailureAggregator, OBJECT_DOES_NOT_EXIST, OBJECT_DOES_NOT_EXIST_OR_UUID_MISMATCH};
pub use statement::{BatchStatement, Shape, StatementBuilder, TableTarget};
pub use writer::{FeatureWriter, WritePhase};
