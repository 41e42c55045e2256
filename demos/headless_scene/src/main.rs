// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that commits a small scene into a [`MemoryTree`].
//!
//! Runs 60 frames on a manual clock with a 60 fps cap, a few early ticks that
//! get dropped and a few hitches that raise the frame priority. Events go to
//! both a [`PrettyPrintSink`] on stderr and a [`RecorderSink`], which is then
//! exported as a Chrome trace JSON file.

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::{Size, Vec2};
use lamina_core::container::ContainerSurface;
use lamina_core::engine::{Engine, EngineConfig, FrameEvent, FrameOutcome};
use lamina_core::memory::MemoryTree;
use lamina_core::modifier::{Constant, Modifier};
use lamina_core::surface::Surface;
use lamina_core::time::{HostTime, ManualClock, Timebase};
use lamina_core::trace::Tracer;
use lamina_core::transform::Transform3d;
use lamina_core::view::View;
use lamina_debug::Tee;
use lamina_debug::pretty::PrettyPrintSink;
use lamina_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 60;
const FRAME_MS: f64 = 17.0;
/// Frames that arrive late enough to be classified critical.
const HITCHES: [u64; 2] = [20, 41];
const HITCH_MS: f64 = 45.0;

fn main() {
    let timebase = Timebase::MILLIS;
    let mut clock = ManualClock::new(HostTime(1_000), timebase);

    // -- engine and root context -----------------------------------------
    let mut engine = Engine::new(EngineConfig::web());
    engine.set_fps_cap(Some(60.0));

    let mut tree = MemoryTree::new();
    let root = engine.buffer_mut().reserve_element();
    tree.mount(root, Size::new(800.0, 600.0));
    let ctx = engine.create_context(root);
    engine.resize(&tree);

    // Seconds since start, written by the prerender listener.
    let seconds = Rc::new(Cell::new(0.0_f64));
    {
        let seconds = Rc::clone(&seconds);
        let start = clock.peek();
        engine.on(FrameEvent::Prerender, move |info| {
            let nanos = timebase.ticks_to_nanos((info.now - start).ticks());
            seconds.set(nanos as f64 / 1e9);
        });
    }

    // -- scene -------------------------------------------------------------
    let registry = engine.registry_mut();

    let title = Surface::new(registry);
    {
        let mut title = title.borrow_mut();
        title.set_size(Some([Some(320.0), Some(48.0)]));
        title.add_class("title");
        title.set_content("lamina");
    }

    let card = ContainerSurface::new(registry);
    card.borrow_mut().set_size(Some([Some(200.0), Some(60.0)]));
    card.borrow_mut().add_class("card");
    for i in 0..3_u32 {
        let badge = Surface::new(registry);
        {
            let mut badge = badge.borrow_mut();
            badge.set_size(Some([Some(40.0), Some(40.0)]));
            badge.set_content(format!("{i}"));
        }
        let offset = Transform3d::from_translation(10.0 + 60.0 * f64::from(i), 10.0, 0.0);
        card.borrow_mut()
            .add_modifier(Rc::new(RefCell::new(
                Modifier::new().with_transform(Constant(offset)),
            )))
            .add_renderable(badge);
    }

    let spinner = View::new(registry);
    let dot = Surface::new(registry);
    dot.borrow_mut().set_size(Some([Some(12.0), Some(12.0)]));
    {
        let seconds = Rc::clone(&seconds);
        spinner
            .borrow_mut()
            .add_modifier(Rc::new(RefCell::new(Modifier::new().with_transform(
                move || Transform3d::from_rotation_z(seconds.get() * std::f64::consts::TAU),
            ))))
            .add_renderable(dot);
    }

    let context = engine.context_mut(ctx).expect("context was just created");
    context.set_perspective(Constant(1000.0));
    {
        let seconds = Rc::clone(&seconds);
        context
            .add_modifier(Rc::new(RefCell::new(
                Modifier::new()
                    .with_transform(move || {
                        Transform3d::from_translation(40.0, 20.0 + 100.0 * seconds.get(), 0.0)
                    })
                    .with_opacity(Constant(0.9)),
            )))
            .add_renderable(title.clone());
    }
    {
        let seconds = Rc::clone(&seconds);
        context
            .add_modifier(Rc::new(RefCell::new(
                Modifier::new()
                    .with_transform(Constant(Transform3d::from_translation(40.0, 300.0, 0.0)))
                    .with_hide(move || (0.4..0.6).contains(&seconds.get())),
            )))
            .add_renderable(card);
    }
    context
        .add_modifier(Rc::new(RefCell::new(
            Modifier::new()
                .with_size(Constant([Some(100.0), Some(100.0)]))
                .with_align(Constant(Vec2::new(0.5, 0.5)))
                .with_origin(Constant(Vec2::new(0.5, 0.5))),
        )))
        .add_renderable(spinner);

    // Work that may spill over several frames.
    for step in 1..=8 {
        let title = Rc::clone(&title);
        engine.defer(move |_| title.borrow_mut().set_content(format!("lamina #{step}")));
    }

    // -- simulated loop ----------------------------------------------------
    let mut sink = Tee(PrettyPrintSink::stderr(timebase).quiet(), RecorderSink::new());
    let mut rendered = 0_u64;
    let mut dropped = 0_u64;

    for frame in 0..FRAME_COUNT {
        let outcome = engine
            .step_traced(&mut clock, &mut tree, &mut Tracer::new(&mut sink))
            .expect("frame step failed");
        match outcome {
            FrameOutcome::Rendered(_) => rendered += 1,
            FrameOutcome::Dropped => dropped += 1,
        }

        let advance = if HITCHES.contains(&frame) {
            HITCH_MS
        } else if frame % 15 == 7 {
            // Too early for the cap.
            FRAME_MS / 2.0
        } else {
            FRAME_MS
        };
        clock.advance_millis(advance);
    }

    println!(
        "{rendered} frames rendered, {dropped} dropped; {} elements, {} ops applied",
        tree.len(),
        tree.applied(),
    );
    if let Some(el) = title.borrow().element() {
        println!(
            "title transform: {}",
            tree.style(el, "transform").unwrap_or("<none>")
        );
    }

    // -- export Chrome trace -----------------------------------------------
    let Tee(_, recorder) = sink;
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    lamina_debug::chrome::export(recorder.as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} steps)");
}
