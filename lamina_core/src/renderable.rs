// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contracts render nodes hold: things that produce a spec and things
//! that rewrite one.

use kurbo::Size;

use crate::spec::RenderSpec;

/// Something that can describe itself as a [`RenderSpec`].
///
/// `render` must be free of side effects: it runs every frame during commit
/// and again for size queries.
pub trait Renderable {
    /// Produces this frame's spec.
    fn render(&self) -> RenderSpec;

    /// Returns the size this renderable wants, if it has an opinion.
    fn size(&self) -> Option<Size> {
        None
    }
}

/// Something that rewrites a child's spec, e.g. to attach a transform.
///
/// Modifiers are never entities themselves; they only wrap what their child
/// rendered.
pub trait Modify {
    /// Returns the spec to use in place of `target`.
    fn modify(&self, target: RenderSpec) -> RenderSpec;
}
