// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame step.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`Engine::step_traced`](crate::engine::Engine::step_traced) calls at each
//! stage. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps during a frame and
//! produces a [`FrameSummary`] at the end.

use crate::engine::{ContextId, FramePriority, FrameReport};
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the frame step is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// `Prerender` listeners.
    Prerender,
    /// Draining the next-tick queue.
    NextTick,
    /// Draining deferred work within the budget.
    Defer,
    /// Context updates and entity commits.
    Update,
    /// Applying the output buffer.
    Flush,
    /// `Postrender` listeners.
    Postrender,
}

impl PhaseKind {
    /// All phases, in step order.
    pub const ALL: [Self; 6] = [
        Self::Prerender,
        Self::NextTick,
        Self::Defer,
        Self::Update,
        Self::Flush,
        Self::Postrender,
    ];

    /// A short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Prerender => "prerender",
            Self::NextTick => "next_tick",
            Self::Defer => "defer",
            Self::Update => "update",
            Self::Flush => "flush",
            Self::Postrender => "postrender",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Prerender => 0,
            Self::NextTick => 1,
            Self::Defer => 2,
            Self::Update => 3,
            Self::Flush => 4,
            Self::Postrender => 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a step renders a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTickEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Host time at the start of the step.
    pub now: HostTime,
    /// Time since the previous rendered frame.
    pub elapsed: Duration,
    /// Pressure classification.
    pub priority: FramePriority,
}

/// Emitted when the FPS cap skips a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDroppedEvent {
    /// Index the next rendered frame will get.
    pub frame_index: u64,
    /// Host time of the skipped step.
    pub now: HostTime,
    /// Time since the previous rendered frame.
    pub elapsed: Duration,
}

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted after each context update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextCommitEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which context.
    pub context: ContextId,
    /// Entities committed.
    pub committed: usize,
    /// Entities cleaned up.
    pub cleaned: usize,
}

/// Emitted after the output buffer is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Operations applied.
    pub ops: usize,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time at the start of the step.
    pub now: HostTime,
    /// Time since the previous rendered frame.
    pub elapsed: Duration,
    /// Pressure classification.
    pub priority: FramePriority,
    /// Phase durations in ticks, indexed like [`PhaseKind::ALL`]; 0 if not
    /// measured.
    pub phase_ticks: [u64; 6],
    /// Entities committed across contexts.
    pub committed: usize,
    /// Entities cleaned up across contexts.
    pub cleaned: usize,
    /// Operations flushed.
    pub ops: usize,
    /// Deferred callbacks carried over.
    pub deferred_remaining: usize,
}

impl FrameSummary {
    /// Duration of `phase` in ticks.
    #[must_use]
    pub const fn phase(&self, phase: PhaseKind) -> u64 {
        self.phase_ticks[phase.index()]
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame step.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame starts rendering.
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        _ = e;
    }

    /// Called when the FPS cap skips a step.
    fn on_frame_dropped(&mut self, e: &FrameDroppedEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after each context update.
    fn on_context_commit(&mut self, e: &ContextCommitEvent) {
        _ = e;
    }

    /// Called after the output buffer is applied.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing and
/// [`is_active`](Self::is_active) is always `false`.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Returns `true` if events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`FrameTickEvent`].
    #[inline]
    pub fn frame_tick(&mut self, e: &FrameTickEvent) {
        dispatch!(self, on_frame_tick, e);
    }

    /// Emits a [`FrameDroppedEvent`].
    #[inline]
    pub fn frame_dropped(&mut self, e: &FrameDroppedEvent) {
        dispatch!(self, on_frame_dropped, e);
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        dispatch!(self, on_phase_begin, e);
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        dispatch!(self, on_phase_end, e);
    }

    /// Emits a [`ContextCommitEvent`].
    #[inline]
    pub fn context_commit(&mut self, e: &ContextCommitEvent) {
        dispatch!(self, on_context_commit, e);
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        dispatch!(self, on_flush, e);
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        dispatch!(self, on_frame_summary, s);
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    tick: FrameTickEvent,
    phase_starts: [Option<HostTime>; 6],
    phase_ends: [Option<HostTime>; 6],
    counts: FrameReport,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given tick.
    #[must_use]
    pub fn new(tick: &FrameTickEvent) -> Self {
        Self {
            tick: *tick,
            phase_starts: [None; 6],
            phase_ends: [None; 6],
            counts: FrameReport::default(),
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase.index()] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase.index()] = Some(t);
    }

    /// Copies the frame's counters.
    pub fn set_counts(&mut self, report: &FrameReport) {
        self.counts = *report;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.tick.frame_index,
            now: self.tick.now,
            elapsed: self.tick.elapsed,
            priority: self.tick.priority,
            phase_ticks: PhaseKind::ALL.map(|phase| self.phase_duration(phase)),
            committed: self.counts.committed,
            cleaned: self.counts.cleaned,
            ops: self.counts.ops,
            deferred_remaining: self.counts.deferred_remaining,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase.index();
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).ticks(),
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
