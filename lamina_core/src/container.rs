// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container surfaces: a surface whose element hosts its own context.

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use kurbo::Size;

use crate::allocator::ElementAllocator;
use crate::context::{Context, ContextUpdate};
use crate::element::ElementOutput;
use crate::entity::{Commit, CommitScope, Entity, EntityId, EntityRegistry};
use crate::error::Error;
use crate::interpret::CommitContext;
use crate::modifier::Axes;
use crate::node::{ModifierRef, RenderNode, RenderableRef};
use crate::output::ElementKind;
use crate::renderable::Renderable;
use crate::spec::RenderSpec;
use crate::surface::resolve_size;

/// Attribute mirrored onto every descendant while the container is hidden.
pub const HIDDEN_ATTRIBUTE: &str = "aria-hidden";

/// A surface whose element is a nested allocator for a floating inner
/// [`Context`].
///
/// Children added to the container render inside its element, positioned
/// relative to it and sized by it.
#[derive(Debug)]
pub struct ContainerSurface {
    id: EntityId,
    output: ElementOutput,
    nested: Option<ElementAllocator>,
    context: Context,
    size: Option<Axes>,
    available: Option<Size>,
    /// Last mirrored hide state and the buffer batch it went out in.
    last_hide: Option<(bool, u64)>,
}

impl ContainerSurface {
    /// Registers a `<div>` container.
    pub fn new(registry: &mut EntityRegistry) -> Rc<RefCell<Self>> {
        Self::with_kind(registry, ElementKind::DIV)
    }

    /// Registers a container drawing an element of `kind`.
    pub fn with_kind(registry: &mut EntityRegistry, kind: ElementKind) -> Rc<RefCell<Self>> {
        registry.register_with(|id| Self {
            id,
            output: ElementOutput::new(kind),
            nested: None,
            context: Context::new(),
            size: None,
            available: None,
            last_hide: None,
        })
    }

    /// The container's entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The nested allocator while committed.
    #[must_use]
    pub fn allocator(&self) -> Option<&ElementAllocator> {
        self.nested.as_ref()
    }

    /// The inner context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The inner context, for adding children or setting a perspective.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Adds a child node to the inner context.
    pub fn add(&mut self, node: RenderNode) -> &mut RenderNode {
        self.context.add(node)
    }

    /// Adds a renderable to the inner context.
    pub fn add_renderable(&mut self, renderable: RenderableRef) -> &mut RenderNode {
        self.context.add_renderable(renderable)
    }

    /// Adds a modifier to the inner context.
    pub fn add_modifier(&mut self, modifier: ModifierRef) -> &mut RenderNode {
        self.context.add_modifier(modifier)
    }

    /// Sets an explicit size; unset axes follow the outer context.
    pub fn set_size(&mut self, size: Option<Axes>) {
        self.size = size;
    }

    /// Adds a CSS class to the container element.
    pub fn add_class(&mut self, class: impl Into<String>) {
        self.output.add_class(class);
    }

    /// Sets an inline style on the container element.
    pub fn set_style(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.output.set_style(name, value);
    }
}

impl Renderable for ContainerSurface {
    fn render(&self) -> RenderSpec {
        RenderSpec::Entity(self.id)
    }

    fn size(&self) -> Option<Size> {
        resolve_size(self.size, self.available)
    }
}

impl Entity for ContainerSurface {
    fn commit(
        &mut self,
        context: &CommitContext,
        scope: &mut CommitScope<'_>,
    ) -> Result<Commit, Error> {
        if let Some(nested) = self.nested.as_mut()
            && scope.buffer.is_lost(nested.container())
        {
            // Everything inside went out in the same discarded batch.
            let container = nested.container();
            self.context
                .cleanup(scope.registry, scope.buffer, Some(nested))?;
            scope.allocator.forget(container);
            self.nested = None;
        }
        if self.nested.is_none() {
            let nested = scope
                .allocator
                .allocate_nested(self.output.kind().clone(), scope.buffer);
            self.output.attach(nested.container(), scope.buffer);
            self.last_hide = None;
            self.nested = Some(nested);
        }
        let Some(nested) = self.nested.as_mut() else {
            return Ok(Commit::Terminal);
        };
        let element = nested.container();
        self.available = context.size;
        let size = resolve_size(self.size, context.size);
        self.output.write(element, context, size, scope.buffer);

        let mirrored = self.last_hide.filter(|&(hide, batch)| {
            hide == context.hide && !scope.buffer.is_discarded(batch)
        });
        if mirrored.is_none() {
            let value = if context.hide { "true" } else { "false" };
            scope
                .buffer
                .set_attribute_deep(element, HIDDEN_ATTRIBUTE, value);
            self.last_hide = Some((context.hide, scope.buffer.batch()));
        }

        let update = ContextUpdate {
            size,
            hide: Some(context.hide),
            ..ContextUpdate::default()
        };
        self.context
            .update(&update, scope.registry, scope.buffer, Some(nested))?;
        Ok(Commit::Terminal)
    }

    fn cleanup(&mut self, scope: &mut CommitScope<'_>) -> Result<(), Error> {
        let Some(mut nested) = self.nested.take() else {
            return Ok(());
        };
        self.context
            .cleanup(scope.registry, scope.buffer, Some(&mut nested))?;
        self.last_hide = None;
        if scope.buffer.is_lost(nested.container()) {
            scope.allocator.forget(nested.container());
            return Ok(());
        }
        self.output.detach(nested.container(), scope.buffer);
        scope.allocator.deallocate_allocator(nested);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::OutputBuffer;
    use crate::memory::MemoryTree;
    use crate::surface::Surface;
    use crate::transform::Transform3d;

    struct Harness {
        registry: EntityRegistry,
        buffer: OutputBuffer,
        allocator: ElementAllocator,
        tree: MemoryTree,
    }

    impl Harness {
        fn new() -> Self {
            let mut buffer = OutputBuffer::new();
            let mut tree = MemoryTree::new();
            let root = buffer.reserve_element();
            tree.mount(root, Size::new(300.0, 300.0));
            Self {
                registry: EntityRegistry::new(),
                buffer,
                allocator: ElementAllocator::new(root),
                tree,
            }
        }

        fn commit(&mut self, node: &mut RenderNode, ctx: &CommitContext) {
            let mut scope = CommitScope::new(&self.registry, &mut self.buffer, &mut self.allocator);
            node.commit(ctx, &mut scope).unwrap();
            self.buffer.flush(&mut self.tree).unwrap();
        }
    }

    #[test]
    fn children_render_inside_the_container_element() {
        let mut h = Harness::new();
        let container = ContainerSurface::new(&mut h.registry);
        container.borrow_mut().set_size(Some([Some(100.0), Some(50.0)]));
        let child = Surface::new(&mut h.registry);
        container.borrow_mut().add_renderable(child.clone());

        let mut node = RenderNode::with_renderable(container.clone());
        let ctx = CommitContext {
            transform: Transform3d::from_translation(20.0, 0.0, 0.0),
            ..CommitContext::with_size(Size::new(300.0, 300.0))
        };
        h.commit(&mut node, &ctx);

        let outer = container.borrow().allocator().unwrap().container();
        let inner = child.borrow().element().unwrap();
        assert_eq!(h.tree.children(h.allocator.container()), [outer]);
        assert_eq!(h.tree.children(outer), [inner]);
        assert_eq!(h.tree.style(inner, "width"), Some("100px"), "sized by the container");
        assert_eq!(
            h.tree.style(inner, "transform"),
            Some(Transform3d::IDENTITY.to_css_matrix3d().as_str()),
            "positioned relative to the container"
        );
    }

    #[test]
    fn hide_toggles_aria_hidden_on_descendants() {
        let mut h = Harness::new();
        let container = ContainerSurface::new(&mut h.registry);
        let child = Surface::new(&mut h.registry);
        container.borrow_mut().add_renderable(child.clone());
        let mut node = RenderNode::with_renderable(container.clone());

        let shown = CommitContext::with_size(Size::new(300.0, 300.0));
        h.commit(&mut node, &shown);
        let outer = container.borrow().allocator().unwrap().container();
        assert_eq!(h.tree.attribute(outer, HIDDEN_ATTRIBUTE), Some("false"));

        let hidden = CommitContext {
            hide: true,
            ..shown
        };
        h.commit(&mut node, &hidden);
        let inner = child.borrow().element().unwrap();
        assert_eq!(h.tree.attribute(outer, HIDDEN_ATTRIBUTE), Some("true"));
        assert_eq!(h.tree.attribute(inner, HIDDEN_ATTRIBUTE), Some("true"));
        assert_eq!(h.tree.style(inner, "visibility"), Some("hidden"));
    }

    #[test]
    fn discarded_container_is_rebuilt_with_its_children() {
        let mut h = Harness::new();
        let container = ContainerSurface::new(&mut h.registry);
        let child = Surface::new(&mut h.registry);
        container.borrow_mut().add_renderable(child.clone());
        let mut node = RenderNode::with_renderable(container.clone());
        let ctx = CommitContext::with_size(Size::new(300.0, 300.0));

        let mut scope = CommitScope::new(&h.registry, &mut h.buffer, &mut h.allocator);
        node.commit(&ctx, &mut scope).unwrap();
        let lost = container.borrow().allocator().unwrap().container();
        h.buffer.discard();

        h.commit(&mut node, &ctx);
        let outer = container.borrow().allocator().unwrap().container();
        let inner = child.borrow().element().unwrap();
        assert_ne!(outer, lost);
        assert_eq!(h.tree.children(h.allocator.container()), [outer]);
        assert_eq!(h.tree.children(outer), [inner]);
        assert_eq!(h.tree.attribute(outer, HIDDEN_ATTRIBUTE), Some("false"));
        assert_eq!(h.allocator.node_count(), 1);
    }

    #[test]
    fn cleanup_returns_the_nested_allocator() {
        let mut h = Harness::new();
        let container = ContainerSurface::new(&mut h.registry);
        let child = Surface::new(&mut h.registry);
        container.borrow_mut().add_renderable(child.clone());
        let mut node = RenderNode::with_renderable(container.clone());
        let ctx = CommitContext::with_size(Size::new(300.0, 300.0));
        h.commit(&mut node, &ctx);

        let mut scope = CommitScope::new(&h.registry, &mut h.buffer, &mut h.allocator);
        assert_eq!(node.cleanup(&mut scope), Ok(1));
        assert!(container.borrow().allocator().is_none());
        assert_eq!(child.borrow().element(), None, "inner context torn down");
        assert_eq!(h.allocator.node_count(), 0);
        assert_eq!(h.allocator.detached_count(), 1);
    }
}
