// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode scene graph with buffered output.
//!
//! `lamina_core` turns a tree of renderables into per-entity placements each
//! frame and commits them as a batch of mutations against a retained output
//! tree, such as a browser document. It is `no_std` compatible (with
//! `alloc`) and knows nothing about any particular output device: backends
//! implement [`OutputTree`](output::OutputTree).
//!
//! # Architecture
//!
//! One frame flows top to bottom; the output buffer is flushed exactly once:
//!
//! ```text
//!   Engine::step()
//!       │
//!       ▼
//!   Context::update() ──► RenderNode::render() ──► RenderSpec
//!                                                     │
//!                 ┌───────────────────────────────────┘
//!                 ▼
//!   interpret::parse() ──► ResolvedUpdates ──► Entity::commit()
//!                                                     │
//!                 ┌───────────────────────────────────┘
//!                 ▼
//!   OutputBuffer (queued Ops) ──► OutputTree::apply()
//! ```
//!
//! **[`entity`]**: Generation-checked registry mapping [`EntityId`]s to
//! committable entities.
//!
//! **[`spec`]** / **[`interpret`]**: The declarative [`RenderSpec`] and the
//! pure interpreter that resolves it into absolute commit contexts.
//!
//! **[`node`]**: [`RenderNode`](node::RenderNode): renderable and modifier
//! trees, the commit pass, and one-frame-deferred cleanup.
//!
//! **[`buffer`]** / **[`output`]**: The ordered operation queue and the
//! output tree contract it flushes into. **[`memory`]** is an in-memory tree
//! for tests and headless runs.
//!
//! **[`allocator`]**: Pools output elements per kind; never destroys them.
//!
//! **[`context`]**: Binds a render node to a container, a size and a
//! perspective.
//!
//! **[`engine`]**: The frame step: FPS cap, priority, next-tick and
//! deferred queues, context updates and the single flush.
//!
//! **[`surface`]**, **[`container`]**, **[`view`]**: Stock entities built
//! on **[`element`]** diffing, driven by **[`modifier`]** state.
//!
//! **[`transform`]** / **[`time`]**: 3D transform math and host time.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-step instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod allocator;
pub mod buffer;
pub mod container;
pub mod context;
pub mod element;
pub mod engine;
pub mod entity;
pub mod error;
pub mod interpret;
pub mod memory;
pub mod modifier;
pub mod node;
pub mod output;
pub mod renderable;
pub mod spec;
pub mod surface;
pub mod time;
pub mod trace;
pub mod transform;
pub mod view;

pub use entity::EntityId;
pub use error::{Error, OutputError};
pub use spec::RenderSpec;
