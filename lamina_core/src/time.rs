// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time, timebase conversion, and clock sources.
//!
//! [`HostTime`] is a point in time in backend-native ticks (microseconds from
//! `performance.now()` on the web, whatever the caller picks for the headless
//! clock).
//! [`Timebase`] carries the rational ticks → nanoseconds factor, so frame
//! budgets expressed in milliseconds can be compared against any backend's
//! ticks without floating-point drift in the stored values.
//!
//! The engine never reads a wall clock itself; it asks a [`TimeSource`]
//! passed into each step. [`ManualClock`] is the deterministic source used by
//! tests and headless runs.

use core::fmt;
use core::ops::{Add, Sub};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// A point in time expressed as backend-native monotonic ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts this host time to nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Rational conversion factor from ticks to nanoseconds.
///
/// `nanoseconds = ticks * numer / denom`
///
/// Backends expose the right instance through their `timebase()` function
/// (e.g. `lamina_backend_web::timebase()` is `1000 / 1` because
/// `performance.now()` is scaled to whole microseconds before it becomes a
/// [`HostTime`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// A timebase where ticks are already nanoseconds (1:1).
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// A timebase where one tick is one millisecond.
    pub const MILLIS: Self = Self {
        numer: 1_000_000,
        denom: 1,
    };

    /// Creates a new timebase with the given numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        wide as u64
    }

    /// Converts nanoseconds to a tick count.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        let wide = nanos as u128 * self.denom as u128 / self.numer as u128;
        wide as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A duration in backend-native ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts this duration to nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Creates a duration from a nanosecond value and timebase.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// Creates a duration from fractional milliseconds.
    ///
    /// Negative and non-finite inputs clamp to zero.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "sub-nanosecond precision is not representable in ticks"
    )]
    pub fn from_millis_f64(millis: f64, timebase: Timebase) -> Self {
        let nanos = millis * NANOS_PER_MILLI;
        if !nanos.is_finite() || nanos <= 0.0 {
            return Self::ZERO;
        }
        Self::from_nanos(nanos as u64, timebase)
    }

    /// Returns this duration as fractional milliseconds.
    #[inline]
    #[must_use]
    pub const fn as_millis_f64(self, timebase: Timebase) -> f64 {
        self.to_nanos(timebase) as f64 / NANOS_PER_MILLI
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

/// A monotonic clock the engine samples during a frame step.
///
/// The step reads the clock once at the start of the frame and again while
/// draining deferred work, to enforce the per-frame deferral budget.
pub trait TimeSource {
    /// Returns the current time.
    fn now(&mut self) -> HostTime;

    /// Returns the timebase of the ticks produced by [`now`](Self::now).
    fn timebase(&self) -> Timebase;
}

/// A deterministic clock driven by the caller.
///
/// Optionally auto-advances by a fixed step after every read, which lets
/// tests model work that takes time without sleeping.
#[derive(Clone, Copy, Debug)]
pub struct ManualClock {
    now: HostTime,
    step: Duration,
    timebase: Timebase,
}

impl ManualClock {
    /// Creates a clock at `start` that only moves when told to.
    #[must_use]
    pub const fn new(start: HostTime, timebase: Timebase) -> Self {
        Self {
            now: start,
            step: Duration::ZERO,
            timebase,
        }
    }

    /// Makes every subsequent [`now`](TimeSource::now) read advance the clock
    /// by `step` after returning.
    #[must_use]
    pub const fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now = self.now + by;
    }

    /// Moves the clock forward by fractional milliseconds.
    pub fn advance_millis(&mut self, millis: f64) {
        self.advance(Duration::from_millis_f64(millis, self.timebase));
    }

    /// Returns the current time without advancing.
    #[inline]
    #[must_use]
    pub const fn peek(&self) -> HostTime {
        self.now
    }
}

impl TimeSource for ManualClock {
    fn now(&mut self) -> HostTime {
        let now = self.now;
        self.now = self.now + self.step;
        now
    }

    fn timebase(&self) -> Timebase {
        self.timebase
    }
}
