//! Wall-clock seam used for snapshot names and version names.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix time in whole seconds.
pub trait Clock {
    fn unix_seconds(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.unix_seconds() > 1_577_836_800);
    }
}
