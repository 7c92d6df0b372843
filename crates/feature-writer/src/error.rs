//! Error types for the feature writer.

use crate::statement::Shape;
use feature_postgresql_types::CodecError;
use thiserror::Error;

/// Kind of batch mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => write!(f, "Insert"),
            Self::Update => write!(f, "Update"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// Errors that can occur while writing a batch of features.
#[derive(Error, Debug)]
pub enum WriterError {
    /// A record that must carry an identity did not.
    #[error("Feature at position {position} has no id")]
    MissingId { position: usize },

    /// Feature could not be encoded into column values.
    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    /// A bound row does not match its statement shape.
    #[error("{shape} expects {expected} parameters per row, got {actual}")]
    ParameterCount {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    /// Store-level execution error from a non-PostgreSQL executor.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The store returned a different number of outcomes than rows submitted.
    #[error("{operation} outcome count mismatch: {submitted} rows submitted as {shape}, {returned} outcomes returned")]
    OutcomeCountMismatch {
        operation: Operation,
        shape: Shape,
        submitted: usize,
        returned: usize,
    },

    /// Some rows were not applied; details are in the caller's failure list.
    #[error("{operation} has failed! {failures} object(s) not modified")]
    ModificationFailed { operation: Operation, failures: usize },
}

impl WriterError {
    /// Whether this error is the escalation of recorded row failures rather
    /// than an abort.
    pub fn is_modification_failure(&self) -> bool {
        matches!(self, Self::ModificationFailed { .. })
    }
}
