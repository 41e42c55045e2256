// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use lamina_core::engine::FramePriority;
use lamina_core::time::{HostTime, Timebase};
use lamina_core::trace::{
    ContextCommitEvent, FlushEvent, FrameDroppedEvent, FrameSummary, FrameTickEvent,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    /// Skip per-phase lines and only print ticks, drops and summaries.
    quiet: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::with_writer(Box::new(std::io::stderr()), timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            quiet: false,
        }
    }

    /// Only prints frame ticks, drops and summaries.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Returns the destination.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn priority_name(priority: FramePriority) -> &'static str {
    match priority {
        FramePriority::Critical => "critical",
        FramePriority::Normal => "normal",
        FramePriority::Generous => "generous",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] frame={} now={:.1}µs elapsed={:.1}µs priority={}",
            e.frame_index,
            self.host_us(e.now),
            self.ticks_to_us(e.elapsed.ticks()),
            priority_name(e.priority),
        );
    }

    fn on_frame_dropped(&mut self, e: &FrameDroppedEvent) {
        let _ = writeln!(
            self.writer,
            "[dropped] next={} now={:.1}µs elapsed={:.1}µs",
            e.frame_index,
            self.host_us(e.now),
            self.ticks_to_us(e.elapsed.ticks()),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        if self.quiet {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        if self.quiet {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            self.host_us(e.timestamp),
        );
    }

    fn on_context_commit(&mut self, e: &ContextCommitEvent) {
        if self.quiet {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[context] frame={} id={} committed={} cleaned={}",
            e.frame_index, e.context.0, e.committed, e.cleaned,
        );
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        if self.quiet {
            return;
        }
        let _ = writeln!(self.writer, "[flush] frame={} ops={}", e.frame_index, e.ops);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = write!(
            self.writer,
            "[summary] frame={} priority={}",
            s.frame_index,
            priority_name(s.priority),
        );
        for phase in PhaseKind::ALL {
            let _ = write!(
                self.writer,
                " {}={:.1}µs",
                phase.name(),
                self.ticks_to_us(s.phase(phase)),
            );
        }
        let _ = writeln!(
            self.writer,
            " committed={} cleaned={} ops={} deferred={}",
            s.committed, s.cleaned, s.ops, s.deferred_remaining,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_core::engine::ContextId;
    use lamina_core::time::Duration;

    #[test]
    fn pretty_print_tick() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MILLIS);
        sink.on_frame_tick(&FrameTickEvent {
            frame_index: 1,
            now: HostTime(16),
            elapsed: Duration(16),
            priority: FramePriority::Generous,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[tick]"), "got: {output}");
        assert!(output.contains("frame=1"), "got: {output}");
        assert!(output.contains("now=16000.0µs"), "got: {output}");
        assert!(output.contains("priority=generous"), "got: {output}");
    }

    #[test]
    fn summary_lists_every_phase() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MILLIS);
        sink.on_frame_summary(&FrameSummary {
            frame_index: 4,
            now: HostTime(100),
            elapsed: Duration(40),
            priority: FramePriority::Critical,
            phase_ticks: [0, 0, 2, 1, 0, 0],
            committed: 3,
            cleaned: 0,
            ops: 9,
            deferred_remaining: 0,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert_eq!(output.lines().count(), 1, "one line per summary: {output}");
        for phase in PhaseKind::ALL {
            assert!(output.contains(phase.name()), "missing {phase:?}: {output}");
        }
        assert!(output.contains("defer=2000.0µs"), "got: {output}");
        assert!(output.contains("priority=critical"), "got: {output}");
    }

    #[test]
    fn quiet_skips_phase_detail() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MILLIS).quiet();
        sink.on_context_commit(&ContextCommitEvent {
            frame_index: 1,
            context: ContextId(0),
            committed: 1,
            cleaned: 0,
        });
        sink.on_flush(&FlushEvent {
            frame_index: 1,
            ops: 2,
        });
        sink.on_frame_dropped(&FrameDroppedEvent {
            frame_index: 2,
            now: HostTime(20),
            elapsed: Duration(4),
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.starts_with("[dropped]"), "got: {output}");
        assert_eq!(output.lines().count(), 1, "got: {output}");
    }
}
