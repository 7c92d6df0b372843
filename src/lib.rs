//! Feature Store Library
//!
//! Loads GeoJSON feature collections and writes them into a PostgreSQL/PostGIS
//! table through the batched writer in `feature_writer`.
//!
//! # Crates
//!
//! - `feature_types` - GeoJSON feature model and version namespace
//! - `feature_postgresql_types` - WKB/GeoJSON column encoding and parameter values
//! - `feature_writer` - batched insert/update/delete with optimistic concurrency
//! - `feature_auth` - credential extraction and JWT verification
//!
//! # CLI Usage
//!
//! ```bash
//! # Insert every feature of a collection
//! feature-store insert --table buildings --input buildings.geojson
//!
//! # Update with version checks, roll back afterwards
//! feature-store update --table buildings --input changed.geojson --check-uuid --dry-run
//!
//! # Delete the ids listed in a collection, read from stdin
//! cat gone.geojson | feature-store delete --table buildings --input -
//! ```

use clap::Args;
use std::path::PathBuf;

pub mod config;
pub mod input;
pub mod write;

pub use write::{apply, execute_write, WriteOutput, WriteReport, WriteRequest};

#[derive(Args, Clone, Debug)]
pub struct StoreOpts {
    /// PostgreSQL connection string
    #[arg(long, env = "POSTGRESQL_CONNECTION_STRING")]
    pub connection_string: String,

    /// Schema of the feature table
    #[arg(long, default_value = "public")]
    pub schema: String,

    /// Feature table name
    #[arg(long)]
    pub table: String,

    /// Statement timeout for the write transaction ("30s", "5m", "1h" or seconds)
    #[arg(long, value_name = "DURATION")]
    pub statement_timeout: Option<String>,

    /// Dry run mode - roll back instead of committing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Clone, Debug)]
pub struct InputOpts {
    /// GeoJSON FeatureCollection file, or "-" for stdin
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,
}
