use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Seconds since the Unix epoch.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
