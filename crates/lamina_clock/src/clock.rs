// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

use crate::ClockControl;

/// Provides an abstraction for time-related operations.
///
/// Cloning a clock is inexpensive and every clone shares the same underlying
/// state: a controlled clock stays linked to its [`ClockControl`], so time
/// adjustments performed through the control are visible to every clone.
///
/// # Examples
///
/// ```
/// use lamina_clock::Clock;
///
/// let clock = Clock::new_system();
/// let t1 = clock.system_time();
/// let t2 = clock.system_time();
/// assert!(t2 >= t1);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    state: ClockState,
}

#[derive(Debug, Clone)]
enum ClockState {
    System,
    Controlled(ClockControl),
}

impl Clock {
    /// Creates a clock that reads machine time.
    #[must_use]
    pub fn new_system() -> Self {
        Self { state: ClockState::System }
    }

    /// Creates a clock frozen at the UNIX epoch.
    ///
    /// The returned clock never advances on its own. Use
    /// [`ClockControl::to_clock`] instead when the test needs to advance time
    /// after construction.
    #[must_use]
    pub fn new_frozen() -> Self {
        ClockControl::new().to_clock()
    }

    pub(crate) fn new_controlled(control: ClockControl) -> Self {
        Self {
            state: ClockState::Controlled(control),
        }
    }

    /// Returns the current absolute time in UTC.
    ///
    /// For a controlled clock this is the manually set time; otherwise the
    /// machine time.
    #[must_use]
    pub fn system_time(&self) -> SystemTime {
        match &self.state {
            ClockState::System => SystemTime::now(),
            ClockState::Controlled(control) => control.now(),
        }
    }

    /// Returns the time elapsed since `earlier`, or zero if the clock has
    /// moved backwards relative to `earlier`.
    ///
    /// Absolute time is not monotonic; callers that only care about "how old
    /// is this entry" should treat a backwards jump as zero age rather than
    /// failing.
    #[must_use]
    pub fn elapsed_since(&self, earlier: SystemTime) -> Duration {
        self.system_time().duration_since(earlier).unwrap_or(Duration::ZERO)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new_system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = Clock::new_system();
        let t1 = clock.system_time();
        let t2 = clock.system_time();
        assert!(t2 >= t1);
    }

    #[test]
    fn frozen_clock_does_not_advance() {
        let clock = Clock::new_frozen();
        assert_eq!(clock.system_time(), SystemTime::UNIX_EPOCH);
        assert_eq!(clock.system_time(), SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn elapsed_since_is_zero_for_future_instants() {
        let clock = Clock::new_frozen();
        let future = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        assert_eq!(clock.elapsed_since(future), Duration::ZERO);
    }

    #[test]
    fn clones_share_control() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let clone = clock.clone();

        control.advance(Duration::from_secs(5));

        assert_eq!(clock.system_time(), clone.system_time());
    }
}
