// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for lamina.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomTree`]: the output tree over live DOM elements
//! - [`PropertyNames`]: vendor-prefix detection, run once at startup
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`PerformanceClock`]: `performance.now()` as a [`TimeSource`]
//!
//! [`drive`] ties them to an [`Engine`].

#![no_std]

extern crate alloc;

mod dom;
mod properties;
mod raf;

use alloc::format;
use alloc::rc::Rc;
use core::cell::RefCell;

pub use dom::DomTree;
pub use properties::PropertyNames;
pub use raf::RafLoop;

use lamina_core::Error;
use lamina_core::engine::{Engine, FrameOutcome};
use lamina_core::output::OutputTree;
use lamina_core::time::{HostTime, TimeSource, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    raf::millis_to_host_time(raf::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
///
/// `Timebase { numer: 1000, denom: 1 }` means `nanoseconds = ticks × 1000`.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::new(1000, 1)
}

/// [`TimeSource`] backed by `performance.now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl TimeSource for PerformanceClock {
    fn now(&mut self) -> HostTime {
        now()
    }

    fn timebase(&self) -> Timebase {
        timebase()
    }
}

/// Steps `engine` into `tree` on every animation frame.
///
/// A step error is thrown as a JS exception, which also ends the loop.
/// Keep the returned loop alive for as long as frames should run.
pub fn drive(engine: Rc<RefCell<Engine>>, tree: Rc<RefCell<DomTree>>) -> RafLoop {
    let mut clock = PerformanceClock;
    let raf = RafLoop::new(move |_| {
        // Throwing unwinds past this frame, so no borrow may be held here.
        if let Err(err) = step_released(&engine, &tree, &mut clock) {
            wasm_bindgen::throw_str(&format!("lamina frame failed: {err}"));
        }
    });
    raf.start();
    raf
}

/// Runs one step with both cells borrowed only for its duration.
fn step_released<T: OutputTree>(
    engine: &RefCell<Engine>,
    tree: &RefCell<T>,
    clock: &mut dyn TimeSource,
) -> Result<FrameOutcome, Error> {
    let mut engine = engine.borrow_mut();
    let mut tree = tree.borrow_mut();
    engine.step(clock, &mut *tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timebase_is_microsecond() {
        let tb = timebase();
        // 1 tick = 1 µs = 1000 ns
        assert_eq!(tb.ticks_to_nanos(1), 1000);
        assert_eq!(tb.ticks_to_nanos(1_000_000), 1_000_000_000);
    }

    #[test]
    fn failed_step_releases_both_cells() {
        use lamina_core::engine::EngineConfig;
        use lamina_core::memory::MemoryTree;
        use lamina_core::time::ManualClock;

        let engine = RefCell::new(Engine::new(EngineConfig::headless()));
        let tree = RefCell::new(MemoryTree::new());
        let mut clock = ManualClock::new(HostTime(0), Timebase::MILLIS);
        {
            let mut engine = engine.borrow_mut();
            let ghost = engine.buffer_mut().reserve_element();
            engine.buffer_mut().set_style(ghost, "color", "red");
        }

        assert!(step_released(&engine, &tree, &mut clock).is_err());
        assert!(engine.try_borrow_mut().is_ok());
        assert!(tree.try_borrow_mut().is_ok());
        assert!(step_released(&engine, &tree, &mut clock).is_ok());
    }

    #[test]
    fn timestamps_convert_to_microseconds() {
        assert_eq!(raf::millis_to_host_time(16.5), HostTime(16_500));
        assert_eq!(raf::millis_to_host_time(0.0), HostTime(0));
    }
}
