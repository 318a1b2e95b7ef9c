//! Time sources
//!
//! The loader asks its clock for "now" each time an operation needs it.
//! Nothing else in the workspace reads the system clock.

use chrono::Utc;

use crate::Timestamp;

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

impl<F> Clock for F
where
    F: Fn() -> Timestamp + Send + Sync,
{
    fn now(&self) -> Timestamp {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn test_fixed_clock_is_frozen() {
        let instant = Utc.with_ymd_and_hms(2025, 9, 11, 8, 0, 0).unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }

    #[test]
    fn test_closure_clock_is_read_on_every_call() {
        let ticks = AtomicI64::new(0);
        let clock = move || {
            let secs = ticks.fetch_add(60, Ordering::SeqCst);
            Utc.timestamp_opt(1_757_577_600 + secs, 0).unwrap()
        };

        let first = clock.now();
        let second = clock.now();
        assert_eq!((second - first).num_seconds(), 60);
    }
}
