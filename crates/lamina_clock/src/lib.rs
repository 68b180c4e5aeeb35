// Copyright (c) The Lamina Project Authors.
// Licensed under the MIT License.

//! Provides an injectable clock for time-dependent cache logic.
//!
//! Working with time is notoriously difficult to test. Cache expiry is driven
//! entirely by timestamps, so every tier in this workspace takes a [`Clock`]
//! rather than calling [`SystemTime::now`] directly. In production the clock
//! reads machine time; in tests a [`ClockControl`] freezes time and advances
//! it manually, which makes TTL tests deterministic and instant.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use lamina_clock::ClockControl;
//!
//! let control = ClockControl::new();
//! let clock = control.to_clock();
//!
//! let before = clock.system_time();
//! control.advance(Duration::from_secs(60));
//! let after = clock.system_time();
//!
//! assert_eq!(after.duration_since(before).unwrap(), Duration::from_secs(60));
//! ```

mod clock;
mod control;

pub use clock::Clock;
pub use control::ClockControl;
