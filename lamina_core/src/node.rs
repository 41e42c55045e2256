// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render nodes: the mutable tree that renders specs and commits them.
//!
//! A [`RenderNode`] holds an optional object (a [`Renderable`] or a
//! [`Modify`]) and zero or more child nodes. Rendering is side-effect free and
//! produces a [`RenderSpec`]; committing resolves that spec and drives every
//! referenced entity's [`Entity::commit`].
//!
//! # Commit bookkeeping
//!
//! Each node remembers which entities it committed last pass. An entity that
//! drops out of the resolved set is not cleaned up immediately: it is marked
//! and cleaned at the start of the *following* pass, so a vanished composite
//! can still reach its descendants when cleanup runs. Composites that report
//! [`Commit::Unchanged`] reuse their cached sub-resolution instead of
//! re-interpreting. Bookkeeping is threaded through return values and
//! swapped into the node once the pass succeeds.
//!
//! [`Entity::commit`]: crate::entity::Entity::commit

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::mem;

use kurbo::Size;

use crate::entity::{Commit, CommitScope, EntityId};
use crate::error::Error;
use crate::interpret::{CommitContext, ResolvedUpdates, parse};
use crate::renderable::{Modify, Renderable};
use crate::spec::RenderSpec;

/// Shared handle to a renderable.
pub type RenderableRef = Rc<RefCell<dyn Renderable>>;

/// Shared handle to a modifier.
pub type ModifierRef = Rc<RefCell<dyn Modify>>;

#[derive(Clone, Default)]
enum NodeObject {
    #[default]
    Empty,
    Renderable(RenderableRef),
    Modifier(ModifierRef),
}

/// How a node renders, derived from its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeMode {
    /// No object and no children.
    Empty,
    /// Delegates to a renderable.
    Renderable,
    /// Passes its children's spec through a modifier.
    Modifier,
    /// Exactly one child, rendered directly.
    SingleChild,
    /// Several children, rendered as a group.
    MultiChild,
}

/// Counts from one commit pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Entities committed, composites and their children included.
    pub committed: usize,
    /// Entities cleaned up at the start of the pass.
    pub cleaned: usize,
}

impl CommitStats {
    /// Adds another pass's counts.
    pub fn accumulate(&mut self, other: Self) {
        self.committed += other.committed;
        self.cleaned += other.cleaned;
    }
}

/// The result of committing one resolution, threaded back to the node.
#[derive(Clone, Debug, Default)]
struct CommitPass {
    committed: ResolvedUpdates,
    composites: BTreeMap<EntityId, ResolvedUpdates>,
}

/// A node in the render tree.
#[derive(Default)]
pub struct RenderNode {
    object: NodeObject,
    children: Vec<RenderNode>,
    committed: ResolvedUpdates,
    composites: BTreeMap<EntityId, ResolvedUpdates>,
    pending_cleanup: Vec<EntityId>,
}

impl fmt::Debug for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderNode")
            .field("mode", &self.mode())
            .field("children", &self.children)
            .field("committed", &self.committed.len())
            .field("pending_cleanup", &self.pending_cleanup)
            .finish_non_exhaustive()
    }
}

impl RenderNode {
    /// Creates an empty node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node wrapping a renderable.
    #[must_use]
    pub fn with_renderable(renderable: RenderableRef) -> Self {
        Self {
            object: NodeObject::Renderable(renderable),
            ..Self::default()
        }
    }

    /// Creates a node wrapping a modifier.
    #[must_use]
    pub fn with_modifier(modifier: ModifierRef) -> Self {
        Self {
            object: NodeObject::Modifier(modifier),
            ..Self::default()
        }
    }

    /// Returns the current rendering mode.
    #[must_use]
    pub fn mode(&self) -> NodeMode {
        match (&self.object, self.children.len()) {
            (NodeObject::Renderable(_), _) => NodeMode::Renderable,
            (NodeObject::Modifier(_), _) => NodeMode::Modifier,
            (NodeObject::Empty, 0) => NodeMode::Empty,
            (NodeObject::Empty, 1) => NodeMode::SingleChild,
            (NodeObject::Empty, _) => NodeMode::MultiChild,
        }
    }

    /// Replaces the node's contents with a renderable, dropping children.
    pub fn set_renderable(&mut self, renderable: RenderableRef) -> &mut Self {
        self.object = NodeObject::Renderable(renderable);
        self.children.clear();
        self
    }

    /// Replaces the node's contents with a modifier, dropping children.
    pub fn set_modifier(&mut self, modifier: ModifierRef) -> &mut Self {
        self.object = NodeObject::Modifier(modifier);
        self.children.clear();
        self
    }

    /// Adds a child node and returns it.
    ///
    /// The first child puts an object-less node in single-child mode; the
    /// second upgrades it to multi-child.
    pub fn add(&mut self, child: Self) -> &mut Self {
        let at = self.children.len();
        self.children.push(child);
        &mut self.children[at]
    }

    /// Wraps a renderable in a new child node and returns that node.
    pub fn add_renderable(&mut self, renderable: RenderableRef) -> &mut Self {
        self.add(Self::with_renderable(renderable))
    }

    /// Wraps a modifier in a new child node and returns that node, so the
    /// modified subtree can be built by chaining.
    pub fn add_modifier(&mut self, modifier: ModifierRef) -> &mut Self {
        self.add(Self::with_modifier(modifier))
    }

    /// Child nodes in order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Produces the spec for this subtree.
    ///
    /// Pure: only recurses and collects.
    #[must_use]
    pub fn render(&self) -> RenderSpec {
        if let NodeObject::Renderable(renderable) = &self.object {
            return renderable.borrow().render();
        }
        let result = match self.children.as_slice() {
            [] => RenderSpec::Empty,
            [only] => only.render(),
            many => RenderSpec::Group(many.iter().map(Self::render).collect()),
        };
        match &self.object {
            NodeObject::Modifier(modifier) => modifier.borrow().modify(result),
            _ => result,
        }
    }

    /// The size reported by the wrapped renderable or the first child.
    #[must_use]
    pub fn size(&self) -> Option<Size> {
        match &self.object {
            NodeObject::Renderable(renderable) => renderable.borrow().size(),
            _ => self.children.first().and_then(Self::size),
        }
    }

    /// Entities committed on the last pass, in commit order.
    #[must_use]
    pub fn committed(&self) -> &ResolvedUpdates {
        &self.committed
    }

    /// Entities that will be cleaned up at the start of the next pass.
    #[must_use]
    pub fn pending_cleanup(&self) -> &[EntityId] {
        &self.pending_cleanup
    }

    /// Commits this subtree for one frame.
    ///
    /// 1. Cleans up entities that vanished during the previous pass.
    /// 2. Renders and resolves the spec under `context`.
    /// 3. Commits every resolved entity in order, recursing into composites.
    /// 4. Marks entities that vanished this pass for cleanup next pass.
    ///
    /// Stale ids are skipped.
    ///
    /// # Errors
    ///
    /// Propagates entity errors and [`Error::ReentrantEntity`]. The committed
    /// set is left as it was before the failing pass; entities first
    /// committed during it are queued for cleanup, and every entity it
    /// reached loses its cached resolution.
    pub fn commit(
        &mut self,
        context: &CommitContext,
        scope: &mut CommitScope<'_>,
    ) -> Result<CommitStats, Error> {
        let cleaned = self.run_pending_cleanup(scope)?;

        let spec = self.render();
        let resolved = parse(&spec, context);
        let mut ancestors = Vec::new();
        let mut pass = CommitPass::default();
        if let Err(err) = commit_resolved(
            &resolved,
            context,
            scope,
            &self.composites,
            &mut ancestors,
            &mut pass,
        ) {
            // Entities newly committed before the failure own output the
            // committed set does not know about, and anything committed may
            // have moved past its cached resolution.
            self.pending_cleanup = pass
                .committed
                .ids()
                .filter(|id| !self.committed.contains(*id))
                .collect();
            for id in pass.committed.ids() {
                self.composites.remove(&id);
            }
            return Err(err);
        }

        let vanished = self
            .committed
            .ids()
            .filter(|id| !pass.committed.contains(*id))
            .collect();
        self.pending_cleanup = vanished;
        self.committed = pass.committed;
        self.composites = pass.composites;

        Ok(CommitStats {
            committed: self.committed.len(),
            cleaned,
        })
    }

    /// Cleans up every entity this node still owns output for.
    ///
    /// Used when the owning context is torn down: pending cleanups and the
    /// last committed set are all released now, with no deferral.
    ///
    /// # Errors
    ///
    /// Propagates entity cleanup errors.
    pub fn cleanup(&mut self, scope: &mut CommitScope<'_>) -> Result<usize, Error> {
        let mut cleaned = self.run_pending_cleanup(scope)?;
        self.composites.clear();
        for id in mem::take(&mut self.committed).ids() {
            cleaned += cleanup_entity(id, scope)?;
        }
        Ok(cleaned)
    }

    fn run_pending_cleanup(&mut self, scope: &mut CommitScope<'_>) -> Result<usize, Error> {
        let mut cleaned = 0;
        for id in mem::take(&mut self.pending_cleanup) {
            cleaned += cleanup_entity(id, scope)?;
        }
        Ok(cleaned)
    }
}

fn cleanup_entity(id: EntityId, scope: &mut CommitScope<'_>) -> Result<usize, Error> {
    let Some(entity) = scope.registry.get(id) else {
        return Ok(0);
    };
    let mut entity = entity
        .try_borrow_mut()
        .map_err(|_| Error::ReentrantEntity(id))?;
    entity.cleanup(scope)?;
    Ok(1)
}

/// `ancestors` holds the composites currently being expanded; meeting one of
/// them again means the spec is cyclic. Commits are recorded into `pass` as
/// they happen, so a failed pass still reports what it touched.
fn commit_resolved(
    resolved: &ResolvedUpdates,
    context: &CommitContext,
    scope: &mut CommitScope<'_>,
    previous: &BTreeMap<EntityId, ResolvedUpdates>,
    ancestors: &mut Vec<EntityId>,
    pass: &mut CommitPass,
) -> Result<(), Error> {
    for (id, params) in resolved.iter() {
        if ancestors.contains(&id) {
            return Err(Error::ReentrantEntity(id));
        }
        let Some(entity) = scope.registry.get(id) else {
            continue;
        };
        scope.resolution_cached = previous.contains_key(&id);
        let outcome = entity
            .try_borrow_mut()
            .map_err(|_| Error::ReentrantEntity(id))?
            .commit(params, scope);
        pass.committed.insert(id, *params);

        let nested = match outcome? {
            Commit::Terminal => continue,
            Commit::Recurse(spec) => parse(&spec, context),
            // Only honored when `resolution_cached` was set.
            Commit::Unchanged => match previous.get(&id) {
                Some(cached) => cached.clone(),
                None => continue,
            },
        };
        ancestors.push(id);
        let inner = commit_resolved(&nested, context, scope, previous, ancestors, pass);
        ancestors.pop();
        inner?;
        pass.composites.insert(id, nested);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::ElementAllocator;
    use crate::buffer::OutputBuffer;
    use crate::entity::{Entity, EntityRegistry};
    use crate::modifier::{Constant, Modifier};
    use alloc::vec;

    /// Records commits and cleanups; renders its own id.
    #[derive(Debug, Default)]
    struct Recorder {
        id: Option<EntityId>,
        commits: u32,
        cleanups: u32,
        last: Option<CommitContext>,
    }

    impl Entity for Recorder {
        fn commit(
            &mut self,
            context: &CommitContext,
            _scope: &mut CommitScope<'_>,
        ) -> Result<Commit, Error> {
            self.commits += 1;
            self.last = Some(*context);
            Ok(Commit::Terminal)
        }

        fn cleanup(&mut self, _scope: &mut CommitScope<'_>) -> Result<(), Error> {
            self.cleanups += 1;
            Ok(())
        }
    }

    impl Renderable for Recorder {
        fn render(&self) -> RenderSpec {
            self.id.map_or(RenderSpec::Empty, RenderSpec::Entity)
        }
    }

    /// A renderable whose spec the test controls.
    #[derive(Debug, Default)]
    struct Scene {
        spec: RenderSpec,
    }

    impl Renderable for Scene {
        fn render(&self) -> RenderSpec {
            self.spec.clone()
        }
    }

    /// A composite that expands to a fixed child spec.
    #[derive(Debug)]
    struct Composite {
        child: RenderSpec,
        unchanged: bool,
        commits: u32,
    }

    impl Entity for Composite {
        fn commit(
            &mut self,
            _context: &CommitContext,
            _scope: &mut CommitScope<'_>,
        ) -> Result<Commit, Error> {
            self.commits += 1;
            if self.unchanged && self.commits > 1 {
                Ok(Commit::Unchanged)
            } else {
                Ok(Commit::Recurse(self.child.clone()))
            }
        }
    }

    /// Renders itself back during commit, which must be caught.
    #[derive(Debug)]
    struct SelfRef {
        id: EntityId,
    }

    impl Entity for SelfRef {
        fn commit(
            &mut self,
            _context: &CommitContext,
            _scope: &mut CommitScope<'_>,
        ) -> Result<Commit, Error> {
            Ok(Commit::Recurse(RenderSpec::Entity(self.id)))
        }
    }

    struct Harness {
        registry: EntityRegistry,
        buffer: OutputBuffer,
        allocator: ElementAllocator,
    }

    impl Harness {
        fn new() -> Self {
            let mut buffer = OutputBuffer::new();
            let root = buffer.reserve_element();
            Self {
                registry: EntityRegistry::new(),
                buffer,
                allocator: ElementAllocator::new(root),
            }
        }

        fn recorder(&mut self) -> (EntityId, Rc<RefCell<Recorder>>) {
            let recorder = self.registry.register_with(|id| Recorder {
                id: Some(id),
                ..Recorder::default()
            });
            let id = recorder.borrow().id.unwrap();
            (id, recorder)
        }

        fn commit(&mut self, node: &mut RenderNode) -> CommitStats {
            let mut scope = CommitScope::new(&self.registry, &mut self.buffer, &mut self.allocator);
            node.commit(&CommitContext::ROOT, &mut scope).unwrap()
        }
    }

    #[test]
    fn modes_follow_contents() {
        let mut node = RenderNode::new();
        assert_eq!(node.mode(), NodeMode::Empty);
        node.add(RenderNode::new());
        assert_eq!(node.mode(), NodeMode::SingleChild);
        node.add(RenderNode::new());
        assert_eq!(node.mode(), NodeMode::MultiChild);
        node.set_modifier(Rc::new(RefCell::new(Modifier::new())));
        assert_eq!(node.mode(), NodeMode::Modifier);
        assert!(node.children().is_empty(), "set replaces wholesale");
    }

    #[test]
    fn render_shapes() {
        let mut h = Harness::new();
        let (a, pa) = h.recorder();
        let (b, pb) = h.recorder();

        let mut node = RenderNode::new();
        node.add_renderable(pa);
        assert_eq!(node.render(), RenderSpec::Entity(a), "single child is not grouped");
        node.add_renderable(pb);
        assert_eq!(
            node.render(),
            RenderSpec::Group(vec![RenderSpec::Entity(a), RenderSpec::Entity(b)])
        );
    }

    #[test]
    fn modifier_wraps_children() {
        let mut h = Harness::new();
        let (a, pa) = h.recorder();
        let mut root = RenderNode::new();
        root.add_modifier(Rc::new(RefCell::new(Modifier::new().with_opacity(Constant(0.5)))))
            .add_renderable(pa.clone());

        let stats = h.commit(&mut root);
        assert_eq!(stats.committed, 1);
        let last = pa.borrow().last.unwrap();
        assert_eq!(last.opacity, 0.5);
        assert!(root.committed().contains(a));
    }

    #[test]
    fn cleanup_is_deferred_one_pass() {
        let mut h = Harness::new();
        let (a, pa) = h.recorder();
        let scene = Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(a),
        }));
        let mut node = RenderNode::with_renderable(scene.clone());

        // Frame N: committed.
        h.commit(&mut node);
        assert_eq!(pa.borrow().commits, 1);

        // Frame N+1: gone from the spec, but no cleanup yet.
        scene.borrow_mut().spec = RenderSpec::Empty;
        let stats = h.commit(&mut node);
        assert_eq!(stats.cleaned, 0);
        assert_eq!(pa.borrow().cleanups, 0, "cleanup must wait a frame");
        assert_eq!(node.pending_cleanup(), &[a]);

        // Frame N+2: cleaned up exactly once.
        let stats = h.commit(&mut node);
        assert_eq!(stats.cleaned, 1);
        assert_eq!(pa.borrow().cleanups, 1);
        h.commit(&mut node);
        assert_eq!(pa.borrow().cleanups, 1);
        assert_eq!(pa.borrow().commits, 1);
    }

    #[test]
    fn returning_entity_is_cleaned_then_recommitted() {
        let mut h = Harness::new();
        let (a, pa) = h.recorder();
        let scene = Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(a),
        }));
        let mut node = RenderNode::with_renderable(scene.clone());
        h.commit(&mut node);
        scene.borrow_mut().spec = RenderSpec::Empty;
        h.commit(&mut node);
        // Marked, but it comes back before the cleanup pass runs; the cleanup
        // still runs first, then the entity is committed afresh.
        scene.borrow_mut().spec = RenderSpec::Entity(a);
        h.commit(&mut node);
        assert_eq!(pa.borrow().cleanups, 1);
        assert_eq!(pa.borrow().commits, 2);
        assert!(node.pending_cleanup().is_empty());
    }

    #[test]
    fn stale_ids_are_skipped() {
        let mut h = Harness::new();
        let (a, pa) = h.recorder();
        let mut node = RenderNode::with_renderable(Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(a),
        })));
        h.registry.unregister(a);
        let stats = h.commit(&mut node);
        assert_eq!(stats.committed, 0);
        assert_eq!(pa.borrow().commits, 0);
    }

    #[test]
    fn composites_recurse_under_same_context() {
        let mut h = Harness::new();
        let (child, pc) = h.recorder();
        let outer = h.registry.register(Rc::new(RefCell::new(Composite {
            child: RenderSpec::Entity(child),
            unchanged: false,
            commits: 0,
        })));
        let mut node = RenderNode::with_renderable(Rc::new(RefCell::new(Scene {
            spec: crate::spec::SpecNode::new(outer).with_opacity(0.5).into(),
        })));

        let stats = h.commit(&mut node);
        assert_eq!(stats.committed, 2);
        // The composite saw opacity 0.5; its child resolves under the node's
        // context, not the composite's.
        assert_eq!(pc.borrow().last.unwrap().opacity, 1.0);
        assert!(node.committed().contains(child));
    }

    #[test]
    fn unchanged_composite_reuses_cached_resolution() {
        let mut h = Harness::new();
        let (child, pc) = h.recorder();
        let composite = Rc::new(RefCell::new(Composite {
            child: RenderSpec::Entity(child),
            unchanged: true,
            commits: 0,
        }));
        let outer = h.registry.register(composite.clone());
        let mut node = RenderNode::with_renderable(Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(outer),
        })));

        h.commit(&mut node);
        // Change what the composite would expand to; an unchanged report must
        // keep committing the cached child instead.
        composite.borrow_mut().child = RenderSpec::Empty;
        let stats = h.commit(&mut node);
        assert_eq!(stats.committed, 2);
        assert_eq!(pc.borrow().commits, 2);
        assert!(node.pending_cleanup().is_empty());
    }

    #[test]
    fn vanished_composite_children_are_cleaned() {
        let mut h = Harness::new();
        let (child, pc) = h.recorder();
        let outer = h.registry.register(Rc::new(RefCell::new(Composite {
            child: RenderSpec::Entity(child),
            unchanged: false,
            commits: 0,
        })));
        let scene = Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(outer),
        }));
        let mut node = RenderNode::with_renderable(scene.clone());
        h.commit(&mut node);
        scene.borrow_mut().spec = RenderSpec::Empty;
        h.commit(&mut node);
        assert_eq!(node.pending_cleanup(), &[outer, child]);
        h.commit(&mut node);
        assert_eq!(pc.borrow().cleanups, 1);
    }

    #[test]
    fn self_recursion_is_an_error() {
        let mut h = Harness::new();
        let entity = h.registry.register_with(|id| SelfRef { id });
        let id = entity.borrow().id;
        let mut node = RenderNode::with_renderable(Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(id),
        })));
        let mut scope = CommitScope::new(&h.registry, &mut h.buffer, &mut h.allocator);
        assert_eq!(
            node.commit(&CommitContext::ROOT, &mut scope),
            Err(Error::ReentrantEntity(id))
        );
    }

    #[test]
    fn failed_pass_queues_its_new_entities_for_cleanup() {
        let mut h = Harness::new();
        let (a, pa) = h.recorder();
        let (b, pb) = h.recorder();
        let looped = h.registry.register_with(|id| SelfRef { id });
        let looped = looped.borrow().id;
        let scene = Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(a),
        }));
        let mut node = RenderNode::with_renderable(scene.clone());
        h.commit(&mut node);

        scene.borrow_mut().spec = RenderSpec::Group(vec![
            RenderSpec::Entity(a),
            RenderSpec::Entity(b),
            RenderSpec::Entity(looped),
        ]);
        let mut scope = CommitScope::new(&h.registry, &mut h.buffer, &mut h.allocator);
        assert_eq!(
            node.commit(&CommitContext::ROOT, &mut scope),
            Err(Error::ReentrantEntity(looped))
        );
        assert!(node.committed().contains(a));
        assert!(!node.committed().contains(b));
        assert_eq!(node.pending_cleanup(), &[b, looped]);

        scene.borrow_mut().spec = RenderSpec::Entity(a);
        let stats = h.commit(&mut node);
        assert_eq!(stats.cleaned, 2);
        assert_eq!(pb.borrow().cleanups, 1);
        assert_eq!(pa.borrow().cleanups, 0);
    }

    #[test]
    fn unchanged_without_a_cached_resolution_is_told_so() {
        /// Reports `Unchanged` whenever the node says it may.
        #[derive(Debug)]
        struct Cached {
            id: EntityId,
            child: EntityId,
            seen: Vec<bool>,
        }

        impl Entity for Cached {
            fn commit(
                &mut self,
                _context: &CommitContext,
                scope: &mut CommitScope<'_>,
            ) -> Result<Commit, Error> {
                self.seen.push(scope.resolution_cached);
                if scope.resolution_cached {
                    Ok(Commit::Unchanged)
                } else {
                    Ok(Commit::Recurse(RenderSpec::Entity(self.child)))
                }
            }
        }

        let mut h = Harness::new();
        let (child, pc) = h.recorder();
        let outer = h.registry.register_with(|id| Cached {
            id,
            child,
            seen: Vec::new(),
        });
        let outer_id = outer.borrow().id;
        let mut node = RenderNode::with_renderable(Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(outer_id),
        })));
        h.commit(&mut node);
        let stats = h.commit(&mut node);
        assert_eq!(outer.borrow().seen, [false, true]);
        assert_eq!(stats.committed, 2);
        assert_eq!(pc.borrow().commits, 2);
    }

    #[test]
    fn node_cleanup_releases_everything_now() {
        let mut h = Harness::new();
        let (a, pa) = h.recorder();
        let mut node = RenderNode::with_renderable(Rc::new(RefCell::new(Scene {
            spec: RenderSpec::Entity(a),
        })));
        h.commit(&mut node);
        let mut scope = CommitScope::new(&h.registry, &mut h.buffer, &mut h.allocator);
        assert_eq!(node.cleanup(&mut scope), Ok(1));
        assert_eq!(pa.borrow().cleanups, 1);
        assert!(node.committed().is_empty());
    }

    #[test]
    fn size_comes_from_first_child() {
        struct Fixed;
        impl Renderable for Fixed {
            fn render(&self) -> RenderSpec {
                RenderSpec::Empty
            }
            fn size(&self) -> Option<Size> {
                Some(Size::new(4.0, 2.0))
            }
        }
        let mut node = RenderNode::new();
        node.add_renderable(Rc::new(RefCell::new(Fixed)));
        assert_eq!(node.size(), Some(Size::new(4.0, 2.0)));
    }
}
