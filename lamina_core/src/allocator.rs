// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pooling of physical output elements.
//!
//! An [`ElementAllocator`] owns one container element and recycles the
//! children it creates there. Elements are never destroyed: deallocating
//! returns an element to a per-kind free list, and the next allocation of the
//! same kind pops it back (LIFO, so the most recently used element is reused
//! first). Nested allocators, used by container surfaces, are pooled the same
//! way.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::buffer::OutputBuffer;
use crate::output::{ElementId, ElementKind};

/// Parameters for [`ElementAllocator::allocate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocateRequest {
    /// Element type.
    pub kind: ElementKind,
    /// Create a fresh element as the container's first child instead of
    /// reusing or appending.
    pub insert_first: bool,
    /// Wrap the element in a nested allocator.
    pub nested: bool,
}

impl AllocateRequest {
    /// A plain element of `kind`, appended or reused.
    #[must_use]
    pub fn element(kind: ElementKind) -> Self {
        Self {
            kind,
            insert_first: false,
            nested: false,
        }
    }

    /// A nested allocator whose container is an element of `kind`.
    #[must_use]
    pub fn nested(kind: ElementKind) -> Self {
        Self {
            kind,
            insert_first: false,
            nested: true,
        }
    }

    /// Sets [`insert_first`](Self::insert_first).
    #[must_use]
    pub fn first(mut self) -> Self {
        self.insert_first = true;
        self
    }
}

/// Result of [`ElementAllocator::allocate`].
#[derive(Debug)]
pub enum Allocation {
    /// A plain element.
    Element(ElementId),
    /// A nested allocator rooted at a freshly allocated element.
    Nested(ElementAllocator),
}

/// A pool of output elements living inside one container element.
#[derive(Debug)]
pub struct ElementAllocator {
    container: ElementId,
    detached: BTreeMap<ElementKind, Vec<ElementId>>,
    detached_nested: BTreeMap<ElementKind, Vec<ElementAllocator>>,
    kinds: BTreeMap<ElementId, ElementKind>,
    node_count: usize,
}

impl ElementAllocator {
    /// Creates an allocator that places elements inside `container`.
    #[must_use]
    pub fn new(container: ElementId) -> Self {
        Self {
            container,
            detached: BTreeMap::new(),
            detached_nested: BTreeMap::new(),
            kinds: BTreeMap::new(),
            node_count: 0,
        }
    }

    /// The element this allocator places its children in.
    #[inline]
    #[must_use]
    pub fn container(&self) -> ElementId {
        self.container
    }

    /// Number of elements (including nested containers) currently handed out.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of pooled elements and nested allocators waiting for reuse.
    #[must_use]
    pub fn detached_count(&self) -> usize {
        self.detached.values().map(Vec::len).sum::<usize>()
            + self.detached_nested.values().map(Vec::len).sum::<usize>()
    }

    /// Returns the kind of an element created by this allocator.
    #[must_use]
    pub fn kind_of(&self, element: ElementId) -> Option<&ElementKind> {
        self.kinds.get(&element)
    }

    /// Hands out an element or nested allocator.
    ///
    /// Reuses the most recently freed match unless `insert_first` is set;
    /// otherwise queues creation of a new element and its insertion at the
    /// front or back of the container. Pooled elements whose creation was
    /// [discarded](OutputBuffer::is_lost) are skipped.
    pub fn allocate(&mut self, request: AllocateRequest, buffer: &mut OutputBuffer) -> Allocation {
        self.node_count += 1;
        if request.nested {
            if !request.insert_first
                && let Some(nested) = self.detached_nested.get_mut(&request.kind).and_then(|pool| {
                    pop_live(pool, |n: &Self| buffer.is_lost(n.container))
                })
            {
                return Allocation::Nested(nested);
            }
            let element = self.create(&request, buffer);
            Allocation::Nested(Self::new(element))
        } else {
            if !request.insert_first
                && let Some(element) = self
                    .detached
                    .get_mut(&request.kind)
                    .and_then(|pool| pop_live(pool, |e: &ElementId| buffer.is_lost(*e)))
            {
                return Allocation::Element(element);
            }
            Allocation::Element(self.create(&request, buffer))
        }
    }

    /// Drops an element that never reached the tree without pooling it.
    ///
    /// Unknown elements are ignored.
    pub fn forget(&mut self, element: ElementId) {
        if self.kinds.remove(&element).is_some() {
            self.node_count = self.node_count.saturating_sub(1);
        }
    }

    /// Hands out a plain element of `kind`.
    pub fn allocate_element(&mut self, kind: ElementKind, buffer: &mut OutputBuffer) -> ElementId {
        match self.allocate(AllocateRequest::element(kind), buffer) {
            Allocation::Element(element) => element,
            Allocation::Nested(nested) => nested.container,
        }
    }

    /// Hands out a nested allocator rooted at an element of `kind`.
    pub fn allocate_nested(&mut self, kind: ElementKind, buffer: &mut OutputBuffer) -> Self {
        match self.allocate(AllocateRequest::nested(kind), buffer) {
            Allocation::Nested(nested) => nested,
            Allocation::Element(element) => Self::new(element),
        }
    }

    fn create(&mut self, request: &AllocateRequest, buffer: &mut OutputBuffer) -> ElementId {
        let element = buffer.create_element(request.kind.clone());
        if request.insert_first {
            buffer.prepend_child(self.container, element);
        } else {
            buffer.append_child(self.container, element);
        }
        self.kinds.insert(element, request.kind.clone());
        element
    }

    /// Returns an element to its kind's free list.
    ///
    /// Elements this allocator did not create, and elements already pooled,
    /// are ignored.
    pub fn deallocate(&mut self, element: ElementId) {
        let Some(kind) = self.kinds.get(&element) else {
            return;
        };
        let pool = self.detached.entry(kind.clone()).or_default();
        if pool.contains(&element) {
            return;
        }
        pool.push(element);
        self.node_count = self.node_count.saturating_sub(1);
    }

    /// Returns a nested allocator to the pool, keyed by its container's kind.
    ///
    /// The nested allocator keeps its own pooled children, so reusing it
    /// later brings its subtree back as it was left.
    pub fn deallocate_allocator(&mut self, nested: Self) {
        let Some(kind) = self.kinds.get(&nested.container) else {
            return;
        };
        let pool = self.detached_nested.entry(kind.clone()).or_default();
        if pool.iter().any(|n| n.container == nested.container) {
            return;
        }
        pool.push(nested);
        self.node_count = self.node_count.saturating_sub(1);
    }
}

/// Pops the most recent pool entry that is not lost, dropping lost ones.
fn pop_live<T>(pool: &mut Vec<T>, lost: impl Fn(&T) -> bool) -> Option<T> {
    while let Some(entry) = pool.pop() {
        if !lost(&entry) {
            return Some(entry);
        }
    }
    None
}
