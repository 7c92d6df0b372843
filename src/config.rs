//! Configuration helpers for the command line.

mod duration;

pub use duration::{parse_duration_to_secs, statement_timeout_sql};
