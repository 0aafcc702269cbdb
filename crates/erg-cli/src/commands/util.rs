//! Shared utilities for CLI commands.

use chrono::{DateTime, SecondsFormat};

/// Formats epoch milliseconds as an RFC 3339 UTC timestamp with a `Z` suffix.
///
/// Sub-second precision is dropped: `1709278200123` becomes
/// `2024-03-01T07:30:00Z`.
pub fn millis_to_zulu(millis: i64) -> anyhow::Result<String> {
    let Some(dt) = DateTime::from_timestamp_millis(millis) else {
        anyhow::bail!("timestamp out of range: {millis} ms");
    };
    Ok(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Formats a duration as `H:MM:SS`, or `M:SS` under an hour.
pub fn format_duration(millis: i64) -> String {
    let total_secs = millis.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
