// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame engine: registry, output buffer, contexts and the per-frame
//! step.
//!
//! The host calls [`Engine::step`] once per animation frame. A step that is
//! not dropped by the FPS cap runs, in order:
//!
//! 1. `Prerender` listeners.
//! 2. Callbacks queued with [`Engine::next_tick`] before the step began.
//! 3. [`Engine::defer`] callbacks, while the deferral budget lasts.
//! 4. Every context's update, in creation order.
//! 5. One flush of the output buffer.
//! 6. `Postrender` listeners.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::allocator::ElementAllocator;
use crate::buffer::OutputBuffer;
use crate::context::{Context, ContextUpdate};
use crate::entity::EntityRegistry;
use crate::error::Error;
use crate::output::{ElementId, OutputTree};
use crate::time::{Duration, HostTime, TimeSource};
use crate::trace::{
    ContextCommitEvent, FlushEvent, FrameDroppedEvent, FrameSummaryBuilder, FrameTickEvent,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer,
};

/// Default wall-clock budget for deferred callbacks in one frame.
pub const MAX_DEFER_FRAME_TIME_MS: f64 = 10.0;

/// Properties that keep animating under frame pressure.
pub const CRITICAL_PROPERTIES: &[&str] = &["transform", "opacity"];

/// Configuration for the [`Engine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Maximum frames per second, or `None` to render every tick.
    pub fps_cap: Option<f64>,
    /// Budget for deferred callbacks per frame, in milliseconds.
    pub max_defer_frame_time_ms: f64,
    /// Frames arriving within this many milliseconds are
    /// [`FramePriority::Generous`].
    pub generous_threshold_ms: f64,
    /// Frames arriving later than this many milliseconds are
    /// [`FramePriority::Critical`].
    pub critical_threshold_ms: f64,
    /// Properties allowed to animate in a critical frame.
    pub critical_properties: &'static [&'static str],
}

impl EngineConfig {
    /// Configuration for a browser driven by `requestAnimationFrame`.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            fps_cap: None,
            max_defer_frame_time_ms: MAX_DEFER_FRAME_TIME_MS,
            // One 60Hz interval, and two.
            generous_threshold_ms: 17.0,
            critical_threshold_ms: 34.0,
            critical_properties: CRITICAL_PROPERTIES,
        }
    }

    /// Configuration for simulated frames: no cap and a budget that never
    /// constrains deferred work on a manual clock.
    #[must_use]
    pub const fn headless() -> Self {
        Self {
            fps_cap: None,
            max_defer_frame_time_ms: f64::INFINITY,
            generous_threshold_ms: 17.0,
            critical_threshold_ms: 34.0,
            critical_properties: CRITICAL_PROPERTIES,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::web()
    }
}

/// How much time pressure the current frame is under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FramePriority {
    /// The frame is late; only critical properties should animate.
    Critical,
    /// The frame is somewhat late.
    Normal,
    /// The frame is on time.
    #[default]
    Generous,
}

/// Handle to a context owned by the [`Engine`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub u32);

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.0)
    }
}

/// Engine-wide events listeners can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameEvent {
    /// Before any work in a rendered frame.
    Prerender,
    /// After the flush of a rendered frame.
    Postrender,
    /// After [`Engine::resize`] re-measured the root contexts.
    Resize,
}

/// What listeners are told about the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    /// Index of the rendered frame.
    pub frame_index: u64,
    /// Host time at the start of the step.
    pub now: HostTime,
    /// Time since the previous rendered frame.
    pub elapsed: Duration,
    /// Pressure classification of the frame.
    pub priority: FramePriority,
}

/// Counters for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Index of the rendered frame.
    pub frame_index: u64,
    /// Next-tick callbacks run.
    pub next_ticks: usize,
    /// Deferred callbacks run.
    pub deferred: usize,
    /// Deferred callbacks carried over to later frames.
    pub deferred_remaining: usize,
    /// Contexts updated.
    pub contexts: usize,
    /// Entities committed across all contexts.
    pub committed: usize,
    /// Entities cleaned up across all contexts.
    pub cleaned: usize,
    /// Output operations flushed.
    pub ops: usize,
}

/// Result of one [`Engine::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The FPS cap skipped the frame; nothing ran.
    Dropped,
    /// The frame ran.
    Rendered(FrameReport),
}

type Callback = Box<dyn FnOnce(&mut Engine)>;
type Listener = Box<dyn FnMut(&FrameInfo)>;

/// Owns the entity registry, the shared output buffer and the root contexts,
/// and runs one frame per [`step`](Self::step).
pub struct Engine {
    config: EngineConfig,
    registry: EntityRegistry,
    buffer: OutputBuffer,
    contexts: Vec<Option<Context>>,
    next_tick: VecDeque<Callback>,
    deferred: VecDeque<Callback>,
    listeners: Vec<(FrameEvent, Listener)>,
    last_tick: Option<HostTime>,
    last_info: Option<FrameInfo>,
    frame_index: u64,
    priority: FramePriority,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("buffered_ops", &self.buffer.len())
            .field("contexts", &self.contexts.iter().flatten().count())
            .field("next_tick", &self.next_tick.len())
            .field("deferred", &self.deferred.len())
            .field("frame_index", &self.frame_index)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Creates an engine with no contexts.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: EntityRegistry::new(),
            buffer: OutputBuffer::new(),
            contexts: Vec::new(),
            next_tick: VecDeque::new(),
            deferred: VecDeque::new(),
            listeners: Vec::new(),
            last_tick: None,
            last_info: None,
            frame_index: 0,
            priority: FramePriority::Generous,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The entity registry.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The entity registry, for registering and unregistering entities.
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// The shared output buffer.
    pub fn buffer_mut(&mut self) -> &mut OutputBuffer {
        &mut self.buffer
    }

    /// Creates a root context rendering into `container`.
    ///
    /// The container id is usually reserved with
    /// [`OutputBuffer::reserve_element`] and mounted in the output tree by
    /// the host.
    pub fn create_context(&mut self, container: ElementId) -> ContextId {
        let id = ContextId(u32::try_from(self.contexts.len()).unwrap_or(u32::MAX));
        self.contexts
            .push(Some(Context::with_allocator(ElementAllocator::new(container))));
        id
    }

    /// Looks up a context.
    #[must_use]
    pub fn context(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(id.0 as usize)?.as_ref()
    }

    /// Looks up a context for mutation.
    pub fn context_mut(&mut self, id: ContextId) -> Option<&mut Context> {
        self.contexts.get_mut(id.0 as usize)?.as_mut()
    }

    /// Removes a context, tearing down what it committed.
    ///
    /// Returns `false` if the id was unknown.
    ///
    /// # Errors
    ///
    /// Propagates cleanup errors.
    pub fn remove_context(&mut self, id: ContextId) -> Result<bool, Error> {
        let Some(mut context) = self.contexts.get_mut(id.0 as usize).and_then(Option::take)
        else {
            return Ok(false);
        };
        context.cleanup(&self.registry, &mut self.buffer, None)?;
        Ok(true)
    }

    /// Subscribes `listener` to `event`.
    pub fn on(&mut self, event: FrameEvent, listener: impl FnMut(&FrameInfo) + 'static) {
        self.listeners.push((event, Box::new(listener)));
    }

    /// Queues `f` to run once at the start of the next rendered frame.
    ///
    /// Callbacks queued while next-tick callbacks are running wait for the
    /// frame after.
    pub fn next_tick(&mut self, f: impl FnOnce(&mut Self) + 'static) {
        self.next_tick.push_back(Box::new(f));
    }

    /// Queues low-priority work that runs while the frame's deferral budget
    /// lasts, carrying over to later frames otherwise.
    pub fn defer(&mut self, f: impl FnOnce(&mut Self) + 'static) {
        self.deferred.push_back(Box::new(f));
    }

    /// Sets or clears the FPS cap.
    pub fn set_fps_cap(&mut self, fps: Option<f64>) {
        self.config.fps_cap = fps;
    }

    /// Pressure classification of the most recent rendered frame.
    #[must_use]
    pub fn frame_priority(&self) -> FramePriority {
        self.priority
    }

    /// Whether `property` should animate this frame.
    ///
    /// Under [`FramePriority::Critical`] only the configured critical
    /// properties animate.
    #[must_use]
    pub fn should_property_animate(&self, property: &str) -> bool {
        match self.priority {
            FramePriority::Critical => self.config.critical_properties.contains(&property),
            FramePriority::Normal | FramePriority::Generous => true,
        }
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Deferred callbacks still waiting.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Re-measures every root context's container and notifies `Resize`
    /// listeners.
    pub fn resize(&mut self, tree: &dyn OutputTree) {
        for context in self.contexts.iter_mut().flatten() {
            context.set_size(None, tree);
        }
        let info = self.last_info.unwrap_or(FrameInfo {
            frame_index: self.frame_index,
            now: self.last_tick.unwrap_or_default(),
            elapsed: Duration::ZERO,
            priority: self.priority,
        });
        self.emit(FrameEvent::Resize, &info);
    }

    /// Runs one frame.
    ///
    /// # Errors
    ///
    /// Returns the first commit or flush error. The rest of the frame is
    /// abandoned; a later step starts a fresh frame.
    pub fn step(
        &mut self,
        clock: &mut dyn TimeSource,
        tree: &mut dyn OutputTree,
    ) -> Result<FrameOutcome, Error> {
        self.step_traced(clock, tree, &mut Tracer::none())
    }

    /// Runs one frame, reporting to `tracer`.
    ///
    /// Phase timestamps read the clock only when the tracer has a sink.
    ///
    /// # Errors
    ///
    /// As for [`step`](Self::step).
    pub fn step_traced(
        &mut self,
        clock: &mut dyn TimeSource,
        tree: &mut dyn OutputTree,
        tracer: &mut Tracer<'_>,
    ) -> Result<FrameOutcome, Error> {
        let timebase = clock.timebase();
        let now = clock.now();
        let elapsed = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        let elapsed_ms = elapsed.as_millis_f64(timebase);

        if self.last_tick.is_some()
            && let Some(fps) = self.config.fps_cap
            && fps > 0.0
            && elapsed_ms < 1000.0 / fps
        {
            tracer.frame_dropped(&FrameDroppedEvent {
                frame_index: self.frame_index,
                now,
                elapsed,
            });
            return Ok(FrameOutcome::Dropped);
        }
        self.last_tick = Some(now);

        self.priority = if self.frame_index == 0 || elapsed_ms <= self.config.generous_threshold_ms
        {
            FramePriority::Generous
        } else if elapsed_ms <= self.config.critical_threshold_ms {
            FramePriority::Normal
        } else {
            FramePriority::Critical
        };

        let frame_index = self.frame_index;
        self.frame_index += 1;
        let info = FrameInfo {
            frame_index,
            now,
            elapsed,
            priority: self.priority,
        };
        self.last_info = Some(info);

        let tick = FrameTickEvent {
            frame_index,
            now,
            elapsed,
            priority: self.priority,
        };
        tracer.frame_tick(&tick);
        let mut summary = FrameSummaryBuilder::new(&tick);
        let mut report = FrameReport {
            frame_index,
            ..FrameReport::default()
        };

        let phase = Phases {
            frame_index,
            active: tracer.is_active(),
        };

        phase.begin(PhaseKind::Prerender, clock, tracer, &mut summary);
        self.emit(FrameEvent::Prerender, &info);
        phase.end(PhaseKind::Prerender, clock, tracer, &mut summary);

        phase.begin(PhaseKind::NextTick, clock, tracer, &mut summary);
        let queued = self.next_tick.len();
        for _ in 0..queued {
            let Some(f) = self.next_tick.pop_front() else {
                break;
            };
            f(self);
            report.next_ticks += 1;
        }
        phase.end(PhaseKind::NextTick, clock, tracer, &mut summary);

        phase.begin(PhaseKind::Defer, clock, tracer, &mut summary);
        let budget = Duration::from_millis_f64(self.config.max_defer_frame_time_ms, timebase);
        let unbounded = self.config.max_defer_frame_time_ms.is_infinite();
        while !self.deferred.is_empty()
            && (unbounded || clock.now().saturating_duration_since(now) < budget)
            && let Some(f) = self.deferred.pop_front()
        {
            f(self);
            report.deferred += 1;
        }
        report.deferred_remaining = self.deferred.len();
        phase.end(PhaseKind::Defer, clock, tracer, &mut summary);

        phase.begin(PhaseKind::Update, clock, tracer, &mut summary);
        if let Err(err) = self.update_contexts(frame_index, tracer, &mut report) {
            // The next frame must not flush half of this one.
            self.buffer.discard();
            return Err(err);
        }
        phase.end(PhaseKind::Update, clock, tracer, &mut summary);

        phase.begin(PhaseKind::Flush, clock, tracer, &mut summary);
        report.ops = self.buffer.flush(tree)?;
        tracer.flush(&FlushEvent {
            frame_index,
            ops: report.ops,
        });
        phase.end(PhaseKind::Flush, clock, tracer, &mut summary);

        phase.begin(PhaseKind::Postrender, clock, tracer, &mut summary);
        self.emit(FrameEvent::Postrender, &info);
        phase.end(PhaseKind::Postrender, clock, tracer, &mut summary);

        summary.set_counts(&report);
        tracer.frame_summary(&summary.finish());
        Ok(FrameOutcome::Rendered(report))
    }

    fn update_contexts(
        &mut self,
        frame_index: u64,
        tracer: &mut Tracer<'_>,
        report: &mut FrameReport,
    ) -> Result<(), Error> {
        let update = ContextUpdate::default();
        for (index, slot) in self.contexts.iter_mut().enumerate() {
            let Some(context) = slot else {
                continue;
            };
            let stats = context.update(&update, &self.registry, &mut self.buffer, None)?;
            tracer.context_commit(&ContextCommitEvent {
                frame_index,
                context: ContextId(u32::try_from(index).unwrap_or(u32::MAX)),
                committed: stats.committed,
                cleaned: stats.cleaned,
            });
            report.contexts += 1;
            report.committed += stats.committed;
            report.cleaned += stats.cleaned;
        }
        Ok(())
    }

    fn emit(&mut self, event: FrameEvent, info: &FrameInfo) {
        for (kind, listener) in &mut self.listeners {
            if *kind == event {
                listener(info);
            }
        }
    }
}

/// Phase bookkeeping for one traced step.
struct Phases {
    frame_index: u64,
    active: bool,
}

impl Phases {
    fn begin(
        &self,
        phase: PhaseKind,
        clock: &mut dyn TimeSource,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
    ) {
        if !self.active {
            return;
        }
        let timestamp = clock.now();
        summary.phase_begin(phase, timestamp);
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: self.frame_index,
            phase,
            timestamp,
        });
    }

    fn end(
        &self,
        phase: PhaseKind,
        clock: &mut dyn TimeSource,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
    ) {
        if !self.active {
            return;
        }
        let timestamp = clock.now();
        summary.phase_end(phase, timestamp);
        tracer.phase_end(&PhaseEndEvent {
            frame_index: self.frame_index,
            phase,
            timestamp,
        });
    }
}
