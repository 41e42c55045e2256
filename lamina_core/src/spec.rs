// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render-spec tree: the immutable per-frame description of what should
//! be shown.
//!
//! A spec is rebuilt every frame by rendering the node tree. It is pure data:
//! entity ids at the leaves, lists for siblings, and [`SpecNode`]s that wrap
//! a subtree with placement overrides. Interpretation into per-entity commit
//! parameters lives in [`interpret`](crate::interpret).

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::Vec2;

use crate::entity::EntityId;
use crate::transform::Transform3d;

/// A render-spec tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RenderSpec {
    /// Nothing to show.
    #[default]
    Empty,
    /// A leaf referencing a registered entity.
    Entity(EntityId),
    /// Siblings, resolved in order under the same parent context.
    Group(Vec<RenderSpec>),
    /// A subtree with placement overrides.
    Wrapped(Box<SpecNode>),
}

impl RenderSpec {
    /// Returns `true` for [`RenderSpec::Empty`] and for groups with no
    /// non-empty members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Entity(_) | Self::Wrapped(_) => false,
            Self::Group(specs) => specs.iter().all(Self::is_empty),
        }
    }

    /// Wraps `self` in a [`SpecNode`] with no overrides.
    #[must_use]
    pub fn wrap(self) -> SpecNode {
        SpecNode::new(self)
    }
}

impl From<EntityId> for RenderSpec {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

impl From<Vec<Self>> for RenderSpec {
    fn from(specs: Vec<Self>) -> Self {
        Self::Group(specs)
    }
}

impl From<SpecNode> for RenderSpec {
    fn from(node: SpecNode) -> Self {
        Self::Wrapped(Box::new(node))
    }
}

/// Placement overrides for a subtree.
///
/// Every field is optional; absent fields inherit from the parent context.
/// Size and proportion components are individually optional too: `None`
/// keeps the parent's value for that axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpecNode {
    /// The wrapped subtree.
    pub target: RenderSpec,
    /// Transform composed after the parent transform.
    pub transform: Option<Transform3d>,
    /// Opacity multiplied into the parent opacity.
    pub opacity: Option<f64>,
    /// Anchor point within the subtree's own size, as fractions.
    pub origin: Option<Vec2>,
    /// Attachment point within the parent's size, as fractions.
    pub align: Option<Vec2>,
    /// Absolute size override per axis.
    pub size: Option<[Option<f64>; 2]>,
    /// Multipliers applied to the size per axis.
    pub proportions: Option<[Option<f64>; 2]>,
    /// Hide the subtree.
    pub hide: Option<bool>,
}

impl SpecNode {
    /// Wraps `target` with no overrides.
    #[must_use]
    pub fn new(target: impl Into<RenderSpec>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Sets the transform override.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform3d) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Sets the opacity override.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Sets the origin override.
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Sets the align override.
    #[must_use]
    pub fn with_align(mut self, align: Vec2) -> Self {
        self.align = Some(align);
        self
    }

    /// Sets the size override.
    #[must_use]
    pub fn with_size(mut self, size: [Option<f64>; 2]) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the proportions override.
    #[must_use]
    pub fn with_proportions(mut self, proportions: [Option<f64>; 2]) -> Self {
        self.proportions = Some(proportions);
        self
    }

    /// Sets the hide flag.
    #[must_use]
    pub fn with_hide(mut self, hide: bool) -> Self {
        self.hide = Some(hide);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn id(idx: u32) -> EntityId {
        EntityId { idx, generation: 0 }
    }

    #[test]
    fn empty_groups_are_empty() {
        assert!(RenderSpec::Empty.is_empty());
        assert!(RenderSpec::from(vec![RenderSpec::Empty, RenderSpec::Group(vec![])]).is_empty());
        assert!(!RenderSpec::from(vec![RenderSpec::Empty, id(1).into()]).is_empty());
    }

    #[test]
    fn builder_sets_only_named_fields() {
        let node = RenderSpec::from(id(3)).wrap().with_opacity(0.5).with_hide(true);
        assert_eq!(node.opacity, Some(0.5));
        assert_eq!(node.hide, Some(true));
        assert_eq!(node.transform, None);
        assert_eq!(node.target, RenderSpec::Entity(id(3)));
    }
}
