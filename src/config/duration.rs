//! Duration parsing utilities.

use anyhow::Context;

/// Parse a duration string like "1h", "30m", "300s", "300" into seconds.
/// Supports:
/// - Plain numbers (interpreted as seconds): "300"
/// - Seconds suffix: "300s"
/// - Minutes suffix: "30m"
/// - Hours suffix: "1h"
pub fn parse_duration_to_secs(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (num_str, unit, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, "hours", 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, "minutes", 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, "seconds", 1)
    } else {
        (s, "duration", 1)
    };

    let value: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid {unit} value: {num_str}"))?;
    value
        .checked_mul(multiplier)
        .with_context(|| format!("Duration too large: {s}"))
}

/// `SET LOCAL` statement bounding every statement of the current transaction.
///
/// PostgreSQL takes the value in milliseconds; zero disables the limit.
pub fn statement_timeout_sql(secs: u64) -> String {
    format!("SET LOCAL statement_timeout = {}", secs.saturating_mul(1000))
}
