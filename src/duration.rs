//! Protobuf JSON durations ("3600s", "1.5s")

use std::time::Duration;

/// Parse a protobuf JSON duration. Negative, unit-less or out-of-range
/// values are rejected.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().strip_suffix('s')?.parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}
