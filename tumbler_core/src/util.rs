//! Common time helpers for tumbler_core.

use std::time::Duration;

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Convert a seconds value from config into a `Duration`.
/// - Non-finite and negative inputs map to zero.
/// - Values beyond `Duration::MAX` saturate.
#[inline]
pub fn duration_from_secs(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Duration as whole milliseconds, saturating at `u64::MAX`.
#[inline]
pub fn as_millis_u64(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_convert_and_clamp() {
        assert_eq!(duration_from_secs(2.5), Duration::from_millis(2500));
        assert_eq!(duration_from_secs(0.0), Duration::ZERO);
        assert_eq!(duration_from_secs(-1.0), Duration::ZERO);
        assert_eq!(duration_from_secs(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_secs(f64::MAX), Duration::MAX);
    }

    #[test]
    fn millis_saturate() {
        assert_eq!(as_millis_u64(Duration::from_secs(3)), 3 * MILLIS_PER_SEC);
        assert_eq!(as_millis_u64(Duration::MAX), u64::MAX);
    }
}
