//! Timestamps.

use chrono::{DateTime, SubsecRound, Utc};

/// Current UTC time at millisecond precision.
///
/// Timestamps are persisted as integer milliseconds; truncating here keeps
/// an in-memory value equal to what a later read returns.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_has_millisecond_precision() {
        let t = now();
        assert_eq!(t.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(DateTime::from_timestamp_millis(t.timestamp_millis()), Some(t));
    }
}
