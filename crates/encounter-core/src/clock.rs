//! Time source for the encounter runtime.

use chrono::{DateTime, Utc};

/// Where the runtime reads the current time. Scheduled resumptions and
/// beacon phases are computed from it, so tests can drive time by hand.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Whether `deadline` has been reached.
    fn has_passed(&self, deadline: DateTime<Utc>) -> bool {
        self.now() >= deadline
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn test_system_clock_has_passed_past_but_not_future() {
        let clock = SystemClock;
        let now = clock.now();

        assert!(clock.has_passed(now - TimeDelta::seconds(1)));
        assert!(!clock.has_passed(now + TimeDelta::hours(1)));
    }
}
