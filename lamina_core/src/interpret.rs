// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spec interpretation: turning a [`RenderSpec`] plus an inherited
//! [`CommitContext`] into one resolved context per entity.
//!
//! Interpretation is a pure recursive descent:
//!
//! - **Entity leaf**: inherits the parent context, folding `opacity == 0`
//!   into `hide`, and applies any pending alignment offset.
//! - **Empty**: contributes nothing; the subtree is not touched at all, which
//!   is distinct from being hidden.
//! - **Group**: every member resolves under the same parent context.
//! - **Wrapped**: composes transform and opacity, replaces origin and align,
//!   and, when a size or proportions override starts a new reference frame,
//!   folds pending origin and alignment into the transform before clearing
//!   them.
//!
//! Alignment offsets are mapped through the *size context*: the cumulative
//! transform in effect where the size or origin was last fixed, not the
//! current transform. This keeps alignment stable under an intermediate
//! rotation or scale.
//!
//! A hidden subtree resolves to [`Transform3d::collapsed`] rather than being
//! omitted, so its entities keep their output and only shrink out of view.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::{Size, Vec2};

use crate::entity::EntityId;
use crate::spec::{RenderSpec, SpecNode};
use crate::transform::Transform3d;

/// Fully resolved placement of one entity for one frame.
///
/// Also used as the inherited parent context during interpretation, where
/// `origin` and `align` are still pending (not yet folded into `transform`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommitContext {
    /// Absolute transform.
    pub transform: Transform3d,
    /// Absolute opacity in `[0, 1]`.
    pub opacity: f64,
    /// Anchor point as fractions of `size`.
    pub origin: Vec2,
    /// Attachment point as fractions of the parent size.
    pub align: Vec2,
    /// Available size, if known.
    pub size: Option<Size>,
    /// Whether the entity is hidden.
    pub hide: bool,
}

impl CommitContext {
    /// Identity transform, full opacity, no size.
    pub const ROOT: Self = Self {
        transform: Transform3d::IDENTITY,
        opacity: 1.0,
        origin: Vec2::ZERO,
        align: Vec2::ZERO,
        size: None,
        hide: false,
    };

    /// A root context with a known size.
    #[must_use]
    pub const fn with_size(size: Size) -> Self {
        Self {
            size: Some(size),
            ..Self::ROOT
        }
    }

    /// Wraps `target` in a [`SpecNode`] that reproduces this context when
    /// resolved under [`CommitContext::ROOT`] with the same size.
    ///
    /// Composites use this to re-root their children in their own frame:
    /// the pending origin is folded into the transform because the node
    /// carries a size.
    #[must_use]
    pub fn wrap(&self, target: RenderSpec) -> SpecNode {
        let mut node = SpecNode::new(target)
            .with_transform(self.transform)
            .with_opacity(self.opacity)
            .with_origin(self.origin);
        if let Some(size) = self.size {
            node = node.with_size([Some(size.width), Some(size.height)]);
        }
        if self.hide {
            node = node.with_hide(true);
        }
        node
    }
}

impl Default for CommitContext {
    fn default() -> Self {
        Self::ROOT
    }
}

/// Resolved contexts keyed by entity, in first-encounter order.
///
/// When an entity appears more than once in a spec the later resolution
/// wins but keeps the original position, so commit order stays the
/// depth-first order of first appearance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedUpdates {
    entries: Vec<(EntityId, CommitContext)>,
    index: BTreeMap<EntityId, usize>,
}

impl ResolvedUpdates {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the context for `id`.
    pub fn insert(&mut self, id: EntityId, context: CommitContext) {
        if let Some(&pos) = self.index.get(&id) {
            self.entries[pos].1 = context;
        } else {
            self.index.insert(id, self.entries.len());
            self.entries.push((id, context));
        }
    }

    /// Returns the context resolved for `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&CommitContext> {
        self.index.get(&id).map(|&pos| &self.entries[pos].1)
    }

    /// Returns `true` if `id` was resolved.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Iterates entries in commit order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &CommitContext)> + '_ {
        self.entries.iter().map(|(id, ctx)| (*id, ctx))
    }

    /// Iterates resolved ids in commit order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Number of resolved entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was resolved.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves `spec` under `parent` into one context per referenced entity.
///
/// Pure: the same inputs always produce equal outputs.
#[must_use]
pub fn parse(spec: &RenderSpec, parent: &CommitContext) -> ResolvedUpdates {
    let mut out = ResolvedUpdates::new();
    parse_into(spec, parent, &Transform3d::IDENTITY, &mut out);
    out
}

fn parse_into(
    spec: &RenderSpec,
    parent: &CommitContext,
    size_context: &Transform3d,
    out: &mut ResolvedUpdates,
) {
    match spec {
        RenderSpec::Empty => {}
        RenderSpec::Entity(id) => out.insert(*id, resolve_leaf(parent, size_context)),
        RenderSpec::Group(specs) => {
            for spec in specs {
                parse_into(spec, parent, size_context, out);
            }
        }
        RenderSpec::Wrapped(node) => {
            let (context, next_size_context) = resolve_node(node, parent, size_context);
            parse_into(&node.target, &context, &next_size_context, out);
        }
    }
}

fn resolve_leaf(parent: &CommitContext, size_context: &Transform3d) -> CommitContext {
    let hide = parent.hide || parent.opacity == 0.0;
    let transform = if hide {
        Transform3d::collapsed()
    } else {
        match parent.size {
            Some(size) => aligned(parent.transform, parent.align, size, size_context),
            None => parent.transform,
        }
    };
    CommitContext {
        transform,
        hide,
        ..*parent
    }
}

fn resolve_node(
    node: &SpecNode,
    parent: &CommitContext,
    size_context: &Transform3d,
) -> (CommitContext, Transform3d) {
    let hide = parent.hide || parent.opacity == 0.0 || node.hide == Some(true);
    let mut transform = match node.transform {
        Some(own) => parent.transform * own,
        None => parent.transform,
    };
    let opacity = match node.opacity {
        Some(own) => parent.opacity * own,
        None => parent.opacity,
    };
    let mut origin = parent.origin;
    let mut align = parent.align;
    let mut size = parent.size;
    let mut next_size_context = *size_context;

    if let Some(own) = node.origin {
        origin = own;
        next_size_context = parent.transform;
    }
    if let Some(own) = node.align {
        align = own;
    }

    if node.size.is_some() || node.proportions.is_some() {
        let base = parent.size.unwrap_or(Size::ZERO);
        let mut width = base.width;
        let mut height = base.height;
        if let Some([w, h]) = node.size {
            width = w.unwrap_or(width);
            height = h.unwrap_or(height);
        }
        if let Some([pw, ph]) = node.proportions {
            width *= pw.unwrap_or(1.0);
            height *= ph.unwrap_or(1.0);
        }
        if let Some(parent_size) = parent.size {
            transform = aligned(transform, align, parent_size, size_context);
            if origin != Vec2::ZERO {
                transform = transform.move_then([-origin.x * width, -origin.y * height, 0.0]);
            }
        }
        next_size_context = parent.transform;
        origin = Vec2::ZERO;
        align = Vec2::ZERO;
        size = Some(Size::new(width, height));
    }

    if hide {
        transform = Transform3d::collapsed();
    }

    (
        CommitContext {
            transform,
            opacity,
            origin,
            align,
            size,
            hide,
        },
        next_size_context,
    )
}

fn aligned(transform: Transform3d, align: Vec2, size: Size, size_context: &Transform3d) -> Transform3d {
    if align == Vec2::ZERO {
        return transform;
    }
    let offset = size_context.vec_in_context([align.x * size.width, align.y * size.height, 0.0]);
    transform.then_move(offset)
}
