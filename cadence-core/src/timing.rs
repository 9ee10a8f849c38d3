//! Wait-duration math shared by the loop and the native backends.

use crate::config::TimeoutRounding;
use std::time::{Duration, Instant};

/// Win32 `INFINITE`. Finite waits must stay strictly below it.
pub const NATIVE_INFINITE_MS: u32 = u32::MAX;

/// Time left until `wake`, clamped at zero. `None` wake means wait forever.
pub fn wait_duration(wake: Option<Instant>, now: Instant) -> Option<Duration> {
    wake.map(|wake| wake.saturating_duration_since(now))
}

/// Snaps `duration` to a multiple of the native timer unit.
pub fn quantize(duration: Duration, granularity: Duration, rounding: TimeoutRounding) -> Duration {
    let unit = granularity.as_nanos();
    if unit == 0 {
        return duration;
    }

    let nanos = duration.as_nanos();
    let mut units = nanos / unit;
    if rounding == TimeoutRounding::Ceil && nanos % unit != 0 {
        units += 1;
    }

    let total = units.saturating_mul(unit);
    Duration::from_nanos(u64::try_from(total).unwrap_or(u64::MAX))
}

/// Converts a timeout to whole milliseconds for millisecond-based wait calls.
///
/// `None` maps to `NATIVE_INFINITE_MS`; finite waits saturate one below it.
pub fn native_millis(timeout: Option<Duration>) -> u32 {
    match timeout {
        None => NATIVE_INFINITE_MS,
        Some(duration) => u32::try_from(duration.as_millis())
            .unwrap_or(NATIVE_INFINITE_MS - 1)
            .min(NATIVE_INFINITE_MS - 1),
    }
}
