//! The time source behind `exp` and `nbf` checks

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Whole seconds since 1970-01-01T00:00:00Z, the JWT NumericDate
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnixTime(pub u64);

impl From<SystemTime> for UnixTime {
    fn from(t: SystemTime) -> Self {
        // Times before the epoch clamp to zero
        Self(
            t.duration_since(SystemTime::UNIX_EPOCH)
                .map_or(0, |since| since.as_secs()),
        )
    }
}

/// Tells the current time
pub trait Clock {
    /// The current time
    fn now(&self) -> UnixTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> UnixTime {
        (**self).now()
    }
}

/// Reads [`SystemTime::now`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    fn now(&self) -> UnixTime {
        SystemTime::now().into()
    }
}

/// A clock stopped at a fixed time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl TestClock {
    /// Stops the clock at `time`
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }
}

impl Clock for TestClock {
    fn now(&self) -> UnixTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use color_eyre::Result;

    use super::*;

    #[test]
    fn test_clock_stays_put() {
        let clock = TestClock::new(UnixTime(1_000));
        assert_eq!(clock.now(), UnixTime(1_000));
        assert_eq!((&clock).now(), UnixTime(1_000));
    }

    #[test]
    fn pre_epoch_system_time_clamps_to_zero() {
        let before = SystemTime::UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(UnixTime::from(before), UnixTime(0));
    }

    #[test]
    fn reads_integer_numeric_date() -> Result<()> {
        let time: UnixTime = serde_json::from_str("1700000000")?;
        assert_eq!(time, UnixTime(1_700_000_000));
        assert_eq!(serde_json::to_string(&time)?, "1700000000");
        assert!(serde_json::from_str::<UnixTime>("\"1700000000\"").is_err());
        Ok(())
    }
}
