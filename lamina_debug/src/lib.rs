// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for lamina
//! diagnostics.
//!
//! This crate provides [`TraceSink`](lamina_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//! - [`Tee`]: fans events out to two sinks, e.g. print and record at once.

pub mod chrome;
pub mod pretty;
pub mod recorder;

use lamina_core::trace::{
    ContextCommitEvent, FlushEvent, FrameDroppedEvent, FrameSummary, FrameTickEvent,
    PhaseBeginEvent, PhaseEndEvent, TraceSink,
};

/// Forwards every event to both sinks, `A` first.
#[derive(Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        self.0.on_frame_tick(e);
        self.1.on_frame_tick(e);
    }

    fn on_frame_dropped(&mut self, e: &FrameDroppedEvent) {
        self.0.on_frame_dropped(e);
        self.1.on_frame_dropped(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.0.on_phase_begin(e);
        self.1.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.0.on_phase_end(e);
        self.1.on_phase_end(e);
    }

    fn on_context_commit(&mut self, e: &ContextCommitEvent) {
        self.0.on_context_commit(e);
        self.1.on_context_commit(e);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.0.on_flush(e);
        self.1.on_flush(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.0.on_frame_summary(s);
        self.1.on_frame_summary(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{RecorderSink, decode};

    #[test]
    fn tee_feeds_both_sinks() {
        let mut tee = Tee(RecorderSink::new(), RecorderSink::new());
        tee.on_flush(&FlushEvent {
            frame_index: 1,
            ops: 3,
        });
        let Tee(a, b) = tee;
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(decode(a.as_bytes()).count(), 1);
    }
}
