// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

use crate::Clock;

/// Controls the flow of time in tests.
///
/// This is useful for testing time-sensitive code without having to wait for
/// real time to pass. TTL expiry becomes a matter of calling
/// [`ClockControl::advance`] instead of sleeping.
///
/// To create a [`Clock`] from `ClockControl`, use [`ClockControl::to_clock`].
/// All clocks created from the same control observe the same time.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// use lamina_clock::ClockControl;
///
/// let control = ClockControl::new();
/// let clock = control.to_clock();
///
/// assert_eq!(clock.system_time(), SystemTime::UNIX_EPOCH);
///
/// control.advance(Duration::from_secs(1));
///
/// assert_eq!(
///     clock.system_time(),
///     SystemTime::UNIX_EPOCH + Duration::from_secs(1)
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClockControl {
    // Time control has to be consistent across threads, hence the mutex.
    // This is never on a hot path.
    state: Arc<Mutex<Option<SystemTime>>>,
}

impl ClockControl {
    /// Creates a new control with time frozen at the UNIX epoch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new control with time frozen at the given instant.
    #[must_use]
    pub fn starting_at(start: SystemTime) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(start))),
        }
    }

    /// Creates a clock driven by this control.
    #[must_use]
    pub fn to_clock(&self) -> Clock {
        Clock::new_controlled(self.clone())
    }

    /// Advances the controlled time by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock();
        let current = state.unwrap_or(SystemTime::UNIX_EPOCH);
        *state = Some(current + duration);
    }

    /// Sets the controlled time to an absolute instant.
    ///
    /// Setting time backwards is allowed; entry-age calculations treat a
    /// backwards jump as zero elapsed time.
    pub fn set(&self, time: SystemTime) {
        *self.state.lock() = Some(time);
    }

    pub(crate) fn now(&self) -> SystemTime {
        self.state.lock().unwrap_or(SystemTime::UNIX_EPOCH)
    }
}
