// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Counters are stored as `u64` regardless of the platform's `usize`.

use lamina_core::engine::{ContextId, FramePriority};
use lamina_core::time::{Duration, HostTime};
use lamina_core::trace::{
    ContextCommitEvent, FlushEvent, FrameDroppedEvent, FrameSummary, FrameTickEvent,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_TICK: u8 = 1;
const TAG_FRAME_DROPPED: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_CONTEXT_COMMIT: u8 = 5;
const TAG_FLUSH: u8 = 6;
const TAG_FRAME_SUMMARY: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    fn write_priority(&mut self, p: FramePriority) {
        self.write_u8(match p {
            FramePriority::Critical => 0,
            FramePriority::Normal => 1,
            FramePriority::Generous => 2,
        });
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Prerender => 0,
            PhaseKind::NextTick => 1,
            PhaseKind::Defer => 2,
            PhaseKind::Update => 3,
            PhaseKind::Flush => 4,
            PhaseKind::Postrender => 5,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        self.write_u8(TAG_FRAME_TICK);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.ticks());
        self.write_u64(e.elapsed.ticks());
        self.write_priority(e.priority);
    }

    fn on_frame_dropped(&mut self, e: &FrameDroppedEvent) {
        self.write_u8(TAG_FRAME_DROPPED);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.ticks());
        self.write_u64(e.elapsed.ticks());
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_context_commit(&mut self, e: &ContextCommitEvent) {
        self.write_u8(TAG_CONTEXT_COMMIT);
        self.write_u64(e.frame_index);
        self.write_u32(e.context.0);
        self.write_count(e.committed);
        self.write_count(e.cleaned);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.write_u8(TAG_FLUSH);
        self.write_u64(e.frame_index);
        self.write_count(e.ops);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.now.ticks());
        self.write_u64(s.elapsed.ticks());
        self.write_priority(s.priority);
        for ticks in s.phase_ticks {
            self.write_u64(ticks);
        }
        self.write_count(s.committed);
        self.write_count(s.cleaned);
        self.write_count(s.ops);
        self.write_count(s.deferred_remaining);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`FrameTickEvent`].
    FrameTick(FrameTickEvent),
    /// A [`FrameDroppedEvent`].
    FrameDropped(FrameDroppedEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`ContextCommitEvent`].
    ContextCommit(ContextCommitEvent),
    /// A [`FlushEvent`].
    Flush(FlushEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_duration(&mut self) -> Option<Duration> {
        self.read_u64().map(Duration)
    }

    fn read_priority(&mut self) -> Option<FramePriority> {
        Some(match self.read_u8()? {
            0 => FramePriority::Critical,
            1 => FramePriority::Normal,
            _ => FramePriority::Generous,
        })
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        PhaseKind::ALL.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_frame_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameTick(FrameTickEvent {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            elapsed: self.read_duration()?,
            priority: self.read_priority()?,
        }))
    }

    fn decode_frame_dropped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameDropped(FrameDroppedEvent {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            elapsed: self.read_duration()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_context_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ContextCommit(ContextCommitEvent {
            frame_index: self.read_u64()?,
            context: ContextId(self.read_u32()?),
            committed: self.read_count()?,
            cleaned: self.read_count()?,
        }))
    }

    fn decode_flush(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Flush(FlushEvent {
            frame_index: self.read_u64()?,
            ops: self.read_count()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let now = self.read_time()?;
        let elapsed = self.read_duration()?;
        let priority = self.read_priority()?;
        let mut phase_ticks = [0_u64; 6];
        for ticks in &mut phase_ticks {
            *ticks = self.read_u64()?;
        }
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index,
            now,
            elapsed,
            priority,
            phase_ticks,
            committed: self.read_count()?,
            cleaned: self.read_count()?,
            ops: self.read_count()?,
            deferred_remaining: self.read_count()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_TICK => self.decode_frame_tick(),
            TAG_FRAME_DROPPED => self.decode_frame_dropped(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_CONTEXT_COMMIT => self.decode_context_commit(),
            TAG_FLUSH => self.decode_flush(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
