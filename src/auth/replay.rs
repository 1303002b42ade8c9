//! Replay window enforcement for timestamped envelopes.

use std::time::{SystemTime, UNIX_EPOCH};

use super::error::AuthError;

/// Maximum allowed distance between a signed timestamp and now (5 minutes).
pub const REPLAY_TOLERANCE_MS: i64 = 300_000;

/// Whether `timestamp_ms` lies within `tolerance_ms` of `now_ms`, in either
/// direction.
pub fn check_freshness(timestamp_ms: i64, now_ms: i64, tolerance_ms: i64) -> bool {
    drift(timestamp_ms, now_ms) <= tolerance_ms
}

fn drift(timestamp_ms: i64, now_ms: i64) -> i64 {
    now_ms.saturating_sub(timestamp_ms).saturating_abs()
}

/// Reject `timestamp_ms` when it falls outside the replay window.
pub fn enforce(timestamp_ms: i64, now_ms: i64) -> Result<(), AuthError> {
    if check_freshness(timestamp_ms, now_ms, REPLAY_TOLERANCE_MS) {
        Ok(())
    } else {
        Err(AuthError::ExpiredTimestamp {
            drift_ms: drift(timestamp_ms, now_ms),
        })
    }
}

/// Parse a decimal millisecond timestamp from a header or field.
///
/// Absence and garbage are different failures.
pub fn parse_timestamp(raw: Option<&str>) -> Result<i64, AuthError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::MissingCredentials("timestamp"))?;
    raw.parse()
        .map_err(|_| AuthError::MalformedTimestamp(raw.chars().take(32).collect()))
}

/// Current Unix time in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
