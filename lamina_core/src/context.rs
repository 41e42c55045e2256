// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contexts: a render node bound to an output container and a size.
//!
//! A root context owns a *permanent* allocator for its mounted container. A
//! *floating* context (the inner context of a container surface) has none of
//! its own and is handed an allocator on every update.

use alloc::boxed::Box;
use alloc::format;
use core::fmt;

use kurbo::{Size, Vec2};

use crate::allocator::ElementAllocator;
use crate::buffer::OutputBuffer;
use crate::entity::{CommitScope, EntityRegistry};
use crate::error::Error;
use crate::interpret::CommitContext;
use crate::modifier::ValueSource;
use crate::node::{CommitStats, ModifierRef, RenderNode, RenderableRef};
use crate::output::{ElementId, OutputTree};
use crate::transform::Transform3d;

/// Style property carrying a context's perspective.
pub const PERSPECTIVE_PROPERTY: &str = "perspective";

/// Fields to merge into a context's persistent node context.
///
/// `None` leaves the stored value alone; there is no way to clear a field
/// back to its default through an update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContextUpdate {
    /// New root transform.
    pub transform: Option<Transform3d>,
    /// New root opacity.
    pub opacity: Option<f64>,
    /// New root origin.
    pub origin: Option<Vec2>,
    /// New root align.
    pub align: Option<Vec2>,
    /// New root size.
    pub size: Option<Size>,
    /// New hide flag.
    pub hide: Option<bool>,
}

impl ContextUpdate {
    fn merge_into(&self, context: &mut CommitContext) {
        if let Some(transform) = self.transform {
            context.transform = transform;
        }
        if let Some(opacity) = self.opacity {
            context.opacity = opacity;
        }
        if let Some(origin) = self.origin {
            context.origin = origin;
        }
        if let Some(align) = self.align {
            context.align = align;
        }
        if let Some(size) = self.size {
            context.size = Some(size);
        }
        if let Some(hide) = self.hide {
            context.hide = hide;
        }
    }
}

/// A render node bound to a container, a size and a perspective.
pub struct Context {
    node: RenderNode,
    allocator: Option<ElementAllocator>,
    node_context: CommitContext,
    perspective: Option<Box<dyn ValueSource<f64>>>,
    /// Last written perspective and the buffer batch it went out in.
    committed_perspective: Option<(f64, u64)>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("node", &self.node)
            .field("allocator", &self.allocator)
            .field("node_context", &self.node_context)
            .field("perspective", &self.perspective())
            .finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a floating context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            node: RenderNode::new(),
            allocator: None,
            node_context: CommitContext::ROOT,
            perspective: None,
            committed_perspective: None,
        }
    }

    /// Creates a context with a permanent allocator.
    #[must_use]
    pub fn with_allocator(allocator: ElementAllocator) -> Self {
        Self {
            allocator: Some(allocator),
            ..Self::new()
        }
    }

    /// Binds a permanent allocator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocatorAlreadyBound`] if one is already bound.
    pub fn bind_allocator(&mut self, allocator: ElementAllocator) -> Result<(), Error> {
        if self.allocator.is_some() {
            return Err(Error::AllocatorAlreadyBound);
        }
        self.allocator = Some(allocator);
        Ok(())
    }

    /// The permanent allocator, if any.
    #[must_use]
    pub fn allocator(&self) -> Option<&ElementAllocator> {
        self.allocator.as_ref()
    }

    /// The container element of the permanent allocator, if any.
    #[must_use]
    pub fn container(&self) -> Option<ElementId> {
        self.allocator.as_ref().map(ElementAllocator::container)
    }

    /// The root render node.
    #[must_use]
    pub fn node(&self) -> &RenderNode {
        &self.node
    }

    /// Adds a child node to the root node and returns it.
    pub fn add(&mut self, node: RenderNode) -> &mut RenderNode {
        self.node.add(node)
    }

    /// Adds a renderable under the root node.
    pub fn add_renderable(&mut self, renderable: RenderableRef) -> &mut RenderNode {
        self.node.add_renderable(renderable)
    }

    /// Adds a modifier under the root node and returns its node for chaining.
    pub fn add_modifier(&mut self, modifier: ModifierRef) -> &mut RenderNode {
        self.node.add_modifier(modifier)
    }

    /// The persistent context commits resolve under.
    #[must_use]
    pub fn node_context(&self) -> &CommitContext {
        &self.node_context
    }

    /// The current size, if known.
    #[must_use]
    pub fn size(&self) -> Option<Size> {
        self.node_context.size
    }

    /// Sets the size, measuring the permanent container when `size` is
    /// `None`.
    ///
    /// A floating context, or a container the tree cannot measure, keeps its
    /// previous size.
    pub fn set_size(&mut self, size: Option<Size>, tree: &dyn OutputTree) {
        let size = size.or_else(|| self.container().and_then(|c| tree.measure(c)));
        if let Some(size) = size {
            self.node_context.size = Some(size);
        }
    }

    /// Sets the perspective source. The value is re-read on every update and
    /// written to the container only when it changes.
    pub fn set_perspective(&mut self, source: impl ValueSource<f64> + 'static) {
        self.perspective = Some(Box::new(source));
    }

    /// The current perspective.
    #[must_use]
    pub fn perspective(&self) -> Option<f64> {
        self.perspective.as_ref().map(|p| p.get())
    }

    /// Merges `update` into the node context and commits the render node.
    ///
    /// `floating` supplies the allocator for contexts without a permanent one
    /// and is ignored otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAllocator`] if no allocator is available, and
    /// propagates commit errors.
    pub fn update(
        &mut self,
        update: &ContextUpdate,
        registry: &EntityRegistry,
        buffer: &mut OutputBuffer,
        floating: Option<&mut ElementAllocator>,
    ) -> Result<CommitStats, Error> {
        update.merge_into(&mut self.node_context);

        let Self {
            node,
            allocator,
            node_context,
            perspective,
            committed_perspective,
        } = self;
        let allocator = match (allocator.as_mut(), floating) {
            (Some(permanent), _) => permanent,
            (None, Some(floating)) => floating,
            (None, None) => return Err(Error::MissingAllocator),
        };

        if let Some(source) = perspective {
            let value = source.get();
            let current = committed_perspective.filter(|&(written, batch)| {
                written == value && !buffer.is_discarded(batch)
            });
            if current.is_none() {
                buffer.set_style(
                    allocator.container(),
                    PERSPECTIVE_PROPERTY,
                    perspective_css(value),
                );
                *committed_perspective = Some((value, buffer.batch()));
            }
        }

        let mut scope = CommitScope::new(registry, buffer, allocator);
        node.commit(node_context, &mut scope)
    }

    /// Tears down everything the render node has committed.
    ///
    /// # Errors
    ///
    /// As for [`update`](Self::update).
    pub fn cleanup(
        &mut self,
        registry: &EntityRegistry,
        buffer: &mut OutputBuffer,
        floating: Option<&mut ElementAllocator>,
    ) -> Result<usize, Error> {
        let allocator = match (self.allocator.as_mut(), floating) {
            (Some(permanent), _) => permanent,
            (None, Some(floating)) => floating,
            (None, None) => return Err(Error::MissingAllocator),
        };
        let mut scope = CommitScope::new(registry, buffer, allocator);
        let cleaned = self.node.cleanup(&mut scope)?;
        self.committed_perspective = None;
        Ok(cleaned)
    }
}

/// Zero clears the declaration.
fn perspective_css(value: f64) -> alloc::string::String {
    if value == 0.0 {
        alloc::string::String::new()
    } else {
        format!("{value:.0}px")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Commit, Entity};
    use crate::memory::MemoryTree;
    use crate::modifier::Constant;
    use crate::renderable::Renderable;
    use crate::spec::RenderSpec;
    use alloc::rc::Rc;
    use core::cell::{Cell, RefCell};

    #[derive(Debug, Default)]
    struct Recorder {
        id: Option<crate::entity::EntityId>,
        last: Option<CommitContext>,
    }

    impl Entity for Recorder {
        fn commit(
            &mut self,
            context: &CommitContext,
            _scope: &mut CommitScope<'_>,
        ) -> Result<Commit, Error> {
            self.last = Some(*context);
            Ok(Commit::Terminal)
        }
    }

    impl Renderable for Recorder {
        fn render(&self) -> RenderSpec {
            self.id.map_or(RenderSpec::Empty, RenderSpec::Entity)
        }
    }

    fn rooted() -> (Context, OutputBuffer, MemoryTree) {
        let mut buffer = OutputBuffer::new();
        let mut tree = MemoryTree::new();
        let root = buffer.reserve_element();
        tree.mount(root, Size::new(800.0, 600.0));
        (Context::with_allocator(ElementAllocator::new(root)), buffer, tree)
    }

    #[test]
    fn rebinding_allocator_fails() {
        let (mut ctx, _, _) = rooted();
        assert_eq!(
            ctx.bind_allocator(ElementAllocator::new(ElementId(7))),
            Err(Error::AllocatorAlreadyBound)
        );
        let mut floating = Context::new();
        assert_eq!(floating.bind_allocator(ElementAllocator::new(ElementId(7))), Ok(()));
    }

    #[test]
    fn floating_context_needs_an_allocator() {
        let mut ctx = Context::new();
        let registry = EntityRegistry::new();
        let mut buffer = OutputBuffer::new();
        assert_eq!(
            ctx.update(&ContextUpdate::default(), &registry, &mut buffer, None),
            Err(Error::MissingAllocator)
        );
        let mut floating = ElementAllocator::new(buffer.reserve_element());
        assert!(
            ctx.update(&ContextUpdate::default(), &registry, &mut buffer, Some(&mut floating))
                .is_ok()
        );
    }

    #[test]
    fn set_size_measures_container_when_omitted() {
        let (mut ctx, _, tree) = rooted();
        ctx.set_size(None, &tree);
        assert_eq!(ctx.size(), Some(Size::new(800.0, 600.0)));
        ctx.set_size(Some(Size::new(1.0, 2.0)), &tree);
        assert_eq!(ctx.size(), Some(Size::new(1.0, 2.0)));
    }

    #[test]
    fn update_merges_only_provided_fields() {
        let (mut ctx, mut buffer, tree) = rooted();
        ctx.set_size(None, &tree);
        let mut registry = EntityRegistry::new();
        let recorder = registry.register_with(|id| Recorder {
            id: Some(id),
            last: None,
        });
        ctx.add_renderable(recorder.clone());

        let first = ContextUpdate {
            opacity: Some(0.5),
            ..ContextUpdate::default()
        };
        ctx.update(&first, &registry, &mut buffer, None).unwrap();
        let second = ContextUpdate {
            transform: Some(Transform3d::from_translation(1.0, 0.0, 0.0)),
            ..ContextUpdate::default()
        };
        let stats = ctx.update(&second, &registry, &mut buffer, None).unwrap();
        assert_eq!(stats.committed, 1);

        let last = recorder.borrow().last.unwrap();
        assert_eq!(last.opacity, 0.5, "earlier field survives a later update");
        assert_eq!(last.transform, Transform3d::from_translation(1.0, 0.0, 0.0));
        assert_eq!(last.size, Some(Size::new(800.0, 600.0)));
    }

    #[test]
    fn perspective_is_written_on_change_only() {
        let (mut ctx, mut buffer, mut tree) = rooted();
        let registry = EntityRegistry::new();
        let depth = Rc::new(Cell::new(500.0));
        let source = depth.clone();
        ctx.set_perspective(move || source.get());

        ctx.update(&ContextUpdate::default(), &registry, &mut buffer, None).unwrap();
        assert_eq!(buffer.len(), 1);
        buffer.flush(&mut tree).unwrap();
        let root = ctx.container().unwrap();
        assert_eq!(tree.style(root, PERSPECTIVE_PROPERTY), Some("500px"));

        ctx.update(&ContextUpdate::default(), &registry, &mut buffer, None).unwrap();
        assert!(buffer.is_empty(), "unchanged perspective writes nothing");

        depth.set(0.0);
        ctx.update(&ContextUpdate::default(), &registry, &mut buffer, None).unwrap();
        buffer.flush(&mut tree).unwrap();
        assert_eq!(tree.style(root, PERSPECTIVE_PROPERTY), None);
    }

    #[test]
    fn discarded_perspective_is_written_again() {
        let (mut ctx, mut buffer, mut tree) = rooted();
        let registry = EntityRegistry::new();
        ctx.set_perspective(Constant(400.0));

        ctx.update(&ContextUpdate::default(), &registry, &mut buffer, None).unwrap();
        assert_eq!(buffer.discard(), 1);
        ctx.update(&ContextUpdate::default(), &registry, &mut buffer, None).unwrap();
        buffer.flush(&mut tree).unwrap();
        let root = ctx.container().unwrap();
        assert_eq!(tree.style(root, PERSPECTIVE_PROPERTY), Some("400px"));
    }

    #[test]
    fn constant_perspective_reports_value() {
        let mut ctx = Context::new();
        assert_eq!(ctx.perspective(), None);
        ctx.set_perspective(Constant(250.0));
        assert_eq!(ctx.perspective(), Some(250.0));
    }

    #[test]
    fn cleanup_releases_committed_entities() {
        #[derive(Debug, Default)]
        struct Counted {
            id: Option<crate::entity::EntityId>,
            cleanups: u32,
        }
        impl Entity for Counted {
            fn cleanup(&mut self, _scope: &mut CommitScope<'_>) -> Result<(), Error> {
                self.cleanups += 1;
                Ok(())
            }
        }
        impl Renderable for Counted {
            fn render(&self) -> RenderSpec {
                self.id.map_or(RenderSpec::Empty, RenderSpec::Entity)
            }
        }

        let (mut ctx, mut buffer, _) = rooted();
        let mut registry = EntityRegistry::new();
        let counted = registry.register_with(|id| Counted {
            id: Some(id),
            cleanups: 0,
        });
        let shared: RenderableRef = counted.clone();
        ctx.add_renderable(shared);
        ctx.update(&ContextUpdate::default(), &registry, &mut buffer, None).unwrap();
        assert_eq!(ctx.cleanup(&registry, &mut buffer, None), Ok(1));
        assert_eq!(counted.borrow().cleanups, 1);
    }

    #[test]
    fn recorder_is_renderable_through_refcell() {
        let cell: Rc<RefCell<Recorder>> = Rc::new(RefCell::new(Recorder::default()));
        assert_eq!(cell.borrow().render(), RenderSpec::Empty);
    }
}
