// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entity identity, the [`Entity`] commit trait, and the registry that maps
//! ids to live entities.
//!
//! Render specs never hold entities directly; they carry [`EntityId`]s which
//! are resolved through the [`EntityRegistry`] at commit time. Ids are
//! generational, so a spec that outlives its entity resolves to nothing
//! instead of reaching a recycled slot.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::allocator::ElementAllocator;
use crate::buffer::OutputBuffer;
use crate::error::Error;
use crate::interpret::CommitContext;
use crate::spec::RenderSpec;

/// A handle to an entity in an [`EntityRegistry`].
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an entity is unregistered and the slot is reused.
/// Ordering is by slot, then generation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl EntityId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}@gen{})", self.idx, self.generation)
    }
}

/// What a committed entity asks of the pipeline afterwards.
#[derive(Clone, Debug, PartialEq)]
pub enum Commit {
    /// The entity wrote its own output; nothing more to do.
    Terminal,
    /// The entity is a composite: resolve this spec under the same context
    /// and commit the result.
    Recurse(RenderSpec),
    /// The entity is a composite whose spec did not change since the last
    /// commit; re-commit its previous resolution without re-interpreting.
    Unchanged,
}

/// Mutable state an entity may touch while committing.
#[derive(Debug)]
pub struct CommitScope<'a> {
    /// Entity lookup, for composites that resolve children.
    pub registry: &'a EntityRegistry,
    /// Output sink; the only way to change the physical tree.
    pub buffer: &'a mut OutputBuffer,
    /// Element pool for the context being committed.
    pub allocator: &'a mut ElementAllocator,
    /// Whether the committing node holds a resolution from an earlier pass
    /// for the entity being committed. [`Commit::Unchanged`] is only honored
    /// while this is set.
    pub resolution_cached: bool,
}

impl<'a> CommitScope<'a> {
    /// Creates a scope.
    #[must_use]
    pub fn new(
        registry: &'a EntityRegistry,
        buffer: &'a mut OutputBuffer,
        allocator: &'a mut ElementAllocator,
    ) -> Self {
        Self {
            registry,
            buffer,
            allocator,
            resolution_cached: false,
        }
    }
}

/// Something that owns physical output and takes part in commit.
///
/// Both methods are optional. An entity that does not override
/// [`commit`](Self::commit) is treated as terminal and writes nothing.
pub trait Entity {
    /// Writes the entity's state for this frame into `scope.buffer`.
    ///
    /// `context` is the fully resolved placement computed by the interpreter.
    ///
    /// # Errors
    ///
    /// Implementations propagate errors from nested contexts; the frame is
    /// aborted.
    fn commit(
        &mut self,
        context: &CommitContext,
        scope: &mut CommitScope<'_>,
    ) -> Result<Commit, Error> {
        _ = (context, scope);
        Ok(Commit::Terminal)
    }

    /// Releases physical output after the entity left the committed set.
    ///
    /// # Errors
    ///
    /// As for [`commit`](Self::commit).
    fn cleanup(&mut self, scope: &mut CommitScope<'_>) -> Result<(), Error> {
        _ = scope;
        Ok(())
    }
}

/// Shared handle to a registered entity.
pub type EntityRef = Rc<RefCell<dyn Entity>>;

/// Maps [`EntityId`]s to live entities.
///
/// Slots are recycled through a free list; each reuse bumps the slot's
/// generation so old ids stop resolving.
#[derive(Default)]
pub struct EntityRegistry {
    entities: Vec<Option<EntityRef>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    live: usize,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("slots", &self.entities.len())
            .field("live", &self.live)
            .field("free", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve(&mut self) -> EntityId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generation[idx as usize] = self.generation[idx as usize].wrapping_add(1);
            idx
        } else {
            let idx = u32::try_from(self.entities.len()).unwrap_or(u32::MAX);
            assert!(idx != u32::MAX, "entity registry exhausted");
            self.entities.push(None);
            self.generation.push(0);
            idx
        };
        self.live += 1;
        EntityId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Registers an already shared entity and returns its id.
    pub fn register(&mut self, entity: EntityRef) -> EntityId {
        let id = self.reserve();
        self.entities[id.idx as usize] = Some(entity);
        id
    }

    /// Registers an entity that needs to know its own id at construction.
    ///
    /// Returns the concrete handle; the registry keeps a type-erased clone.
    pub fn register_with<T, F>(&mut self, build: F) -> Rc<RefCell<T>>
    where
        T: Entity + 'static,
        F: FnOnce(EntityId) -> T,
    {
        let id = self.reserve();
        let entity = Rc::new(RefCell::new(build(id)));
        let erased: EntityRef = entity.clone();
        self.entities[id.idx as usize] = Some(erased);
        entity
    }

    /// Returns the entity for `id`, or `None` if the id is stale or unknown.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<EntityRef> {
        if !self.is_alive(id) {
            return None;
        }
        self.entities[id.idx as usize].clone()
    }

    /// Replaces the entity stored under a live `id`.
    ///
    /// Returns `false` (and stores nothing) if the id is stale.
    pub fn set(&mut self, id: EntityId, entity: EntityRef) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.entities[id.idx as usize] = Some(entity);
        true
    }

    /// Removes an entity, making `id` stale.
    ///
    /// Returns the removed entity, or `None` if `id` was already stale. The
    /// entity is not cleaned up; callers that remove an entity while it is
    /// still committed should clean it up first.
    pub fn unregister(&mut self, id: EntityId) -> Option<EntityRef> {
        if !self.is_alive(id) {
            return None;
        }
        let entity = self.entities[id.idx as usize].take();
        self.free_list.push(id.idx);
        self.live -= 1;
        entity
    }

    /// Returns `true` if `id` refers to a registered entity.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.idx as usize;
        idx < self.generation.len()
            && self.generation[idx] == id.generation
            && self.entities[idx].is_some()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no entities are registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Marker;

    impl Entity for Marker {}

    #[test]
    fn register_and_get() {
        let mut reg = EntityRegistry::new();
        let id = reg.register(Rc::new(RefCell::new(Marker)));
        assert!(reg.is_alive(id));
        assert!(reg.get(id).is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn register_with_sees_its_own_id() {
        let mut reg = EntityRegistry::new();
        let mut seen = None;
        let _handle = reg.register_with(|id| {
            seen = Some(id);
            Marker
        });
        let id = seen.unwrap();
        assert!(reg.is_alive(id));
    }

    #[test]
    fn unregister_makes_id_stale() {
        let mut reg = EntityRegistry::new();
        let id = reg.register(Rc::new(RefCell::new(Marker)));
        assert!(reg.unregister(id).is_some());
        assert!(reg.get(id).is_none());
        assert!(reg.unregister(id).is_none(), "double unregister");
        assert!(reg.is_empty());
    }

    #[test]
    fn recycled_slot_bumps_generation() {
        let mut reg = EntityRegistry::new();
        let a = reg.register(Rc::new(RefCell::new(Marker)));
        reg.unregister(a);
        let b = reg.register(Rc::new(RefCell::new(Marker)));
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(reg.get(a).is_none(), "stale id must not reach the new entity");
        assert!(reg.get(b).is_some());
    }

    #[test]
    fn set_replaces_live_entries_only() {
        let mut reg = EntityRegistry::new();
        let id = reg.register(Rc::new(RefCell::new(Marker)));
        assert!(reg.set(id, Rc::new(RefCell::new(Marker))));
        reg.unregister(id);
        assert!(!reg.set(id, Rc::new(RefCell::new(Marker))));
        assert!(reg.get(id).is_none());
    }
}
