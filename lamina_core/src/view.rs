// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Views: composite entities that group a subtree under one id.

use alloc::rc::Rc;
use core::cell::RefCell;

use kurbo::Size;

use crate::entity::{Commit, CommitScope, Entity, EntityId, EntityRegistry};
use crate::error::Error;
use crate::interpret::CommitContext;
use crate::node::{ModifierRef, RenderNode, RenderableRef};
use crate::renderable::Renderable;
use crate::spec::RenderSpec;

/// A composite entity owning a [`RenderNode`].
///
/// A view renders as its own id. When committed it hands back its subtree
/// wrapped in its resolved placement, so the owning node resolves and
/// commits the children as if they had been placed there directly. If
/// neither the placement nor the subtree changed since the previous frame,
/// and the node still holds the resolution from then, the view reports
/// [`Commit::Unchanged`] and the node reuses it.
///
/// The wrapped placement is absolute, so a view assumes the context that
/// owns it has an identity root transform.
#[derive(Debug)]
pub struct View {
    id: EntityId,
    node: RenderNode,
    last: Option<(CommitContext, RenderSpec)>,
}

impl View {
    /// Registers an empty view.
    pub fn new(registry: &mut EntityRegistry) -> Rc<RefCell<Self>> {
        registry.register_with(|id| Self {
            id,
            node: RenderNode::new(),
            last: None,
        })
    }

    /// The view's entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The inner render node.
    #[must_use]
    pub fn node(&self) -> &RenderNode {
        &self.node
    }

    /// Adds a child node.
    pub fn add(&mut self, node: RenderNode) -> &mut RenderNode {
        self.node.add(node)
    }

    /// Adds a renderable child.
    pub fn add_renderable(&mut self, renderable: RenderableRef) -> &mut RenderNode {
        self.node.add_renderable(renderable)
    }

    /// Adds a modifier child.
    pub fn add_modifier(&mut self, modifier: ModifierRef) -> &mut RenderNode {
        self.node.add_modifier(modifier)
    }
}

impl Renderable for View {
    fn render(&self) -> RenderSpec {
        RenderSpec::Entity(self.id)
    }

    fn size(&self) -> Option<Size> {
        self.node.size()
    }
}

impl Entity for View {
    fn commit(
        &mut self,
        context: &CommitContext,
        scope: &mut CommitScope<'_>,
    ) -> Result<Commit, Error> {
        let inner = self.node.render();
        if scope.resolution_cached
            && let Some((last_context, last_spec)) = &self.last
            && last_context == context
            && *last_spec == inner
        {
            return Ok(Commit::Unchanged);
        }
        let spec = context.wrap(inner.clone()).into();
        self.last = Some((*context, inner));
        Ok(Commit::Recurse(spec))
    }

    fn cleanup(&mut self, _scope: &mut CommitScope<'_>) -> Result<(), Error> {
        self.last = None;
        Ok(())
    }
}
