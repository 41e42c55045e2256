// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Phases become duration slices on thread 0, context commits become
//! instants on one thread per context, and frame summaries also emit counter
//! tracks for ops and committed entities.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use lamina_core::time::Timebase;
use lamina_core::trace::PhaseKind;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// Context commits and flushes carry no timestamp of their own; they are
/// placed at the start of the frame they belong to.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut frame_start = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameTick(e) => {
                frame_start = ticks_to_us(e.now.ticks(), timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "FrameTick",
                    "cat": "Engine",
                    "ts": frame_start,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "elapsed_us": ticks_to_us(e.elapsed.ticks(), timebase),
                        "priority": format!("{:?}", e.priority),
                    }
                }));
            }
            RecordedEvent::FrameDropped(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameDropped",
                    "cat": "Engine",
                    "ts": ticks_to_us(e.now.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "next_frame_index": e.frame_index,
                        "elapsed_us": ticks_to_us(e.elapsed.ticks(), timebase),
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Frame",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Frame",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::ContextCommit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "ContextCommit",
                    "cat": "Context",
                    "ts": frame_start,
                    "pid": 0,
                    "tid": u64::from(e.context.0) + 1,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "committed": e.committed,
                        "cleaned": e.cleaned,
                    }
                }));
            }
            RecordedEvent::Flush(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Flush",
                    "cat": "Frame",
                    "ts": frame_start,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "ops": e.ops,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                let ts = ticks_to_us(s.now.ticks(), timebase);
                let mut args = serde_json::Map::new();
                args.insert("frame_index".into(), json!(s.frame_index));
                args.insert("priority".into(), json!(format!("{:?}", s.priority)));
                for phase in PhaseKind::ALL {
                    args.insert(
                        format!("{}_us", phase.name()),
                        json!(ticks_to_us(s.phase(phase), timebase)),
                    );
                }
                args.insert("deferred_remaining".into(), json!(s.deferred_remaining));
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": Value::Object(args),
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "Work",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "ops": s.ops,
                        "committed": s.committed,
                        "cleaned": s.cleaned,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}
