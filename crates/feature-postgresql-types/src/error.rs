//! Error types for the column encoders.

use thiserror::Error;

/// Errors raised while encoding a feature into column values.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Feature or geometry could not be serialized to JSON.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary geometry could not be written.
    #[error("WKB encoding error: {0}")]
    Wkb(#[from] std::io::Error),

    /// Serialized feature was not a JSON object.
    #[error("Feature did not serialize to a JSON object")]
    NotAnObject,
}
