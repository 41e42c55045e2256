// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! FIFO queue of output operations, flushed once per frame.

use alloc::borrow::Cow;
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use crate::error::OutputError;
use crate::output::{CLASS_LIST, ElementId, ElementKind, Op, OutputTree, PropertyScope};

/// Collects [`Op`]s during a frame and applies them in one pass.
///
/// Everything that mutates the output tree during commit goes through here,
/// so the tree is only touched inside [`flush`](Self::flush). The buffer also
/// hands out [`ElementId`]s, so ids exist before their element does.
///
/// Queued ops belong to a *batch* that ends at the next [`flush`](Self::flush)
/// or [`discard`](Self::discard). Entities that cache what they wrote
/// remember the batch and check [`is_discarded`](Self::is_discarded) before
/// trusting the cache.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    queue: Vec<Op>,
    next_element: u32,
    batch: u64,
    discarded: BTreeSet<u64>,
    lost: BTreeSet<ElementId>,
}

impl OutputBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fresh element id without creating anything.
    ///
    /// Used for elements the host creates itself, such as the mount point of
    /// a root context; the host binds the id in its tree before the first
    /// flush.
    pub fn reserve_element(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        id
    }

    /// Reserves an id and queues creation of an element of `kind` for it.
    pub fn create_element(&mut self, kind: ElementKind) -> ElementId {
        let element = self.reserve_element();
        self.queue.push(Op::CreateElement { element, kind });
        element
    }

    /// Queues an arbitrary operation.
    #[inline]
    pub fn enqueue(&mut self, op: Op) {
        self.queue.push(op);
    }

    /// Queues an inline style assignment. An empty `value` removes it.
    pub fn set_style(
        &mut self,
        element: ElementId,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) {
        self.enqueue(Op::AssignProperty {
            element,
            scope: PropertyScope::Style,
            name: name.into(),
            value: value.into(),
        });
    }

    /// Queues an element property assignment.
    pub fn set_property(
        &mut self,
        element: ElementId,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) {
        self.enqueue(Op::AssignProperty {
            element,
            scope: PropertyScope::Element,
            name: name.into(),
            value: value.into(),
        });
    }

    /// Queues an attribute write.
    pub fn set_attribute(
        &mut self,
        element: ElementId,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) {
        self.enqueue(Op::SetAttribute {
            element,
            name: name.into(),
            value: value.into(),
        });
    }

    /// Queues an attribute removal.
    pub fn remove_attribute(&mut self, element: ElementId, name: impl Into<Cow<'static, str>>) {
        self.enqueue(Op::RemoveAttribute {
            element,
            name: name.into(),
        });
    }

    /// Queues an attribute write on `element` and all its descendants.
    pub fn set_attribute_deep(
        &mut self,
        element: ElementId,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) {
        self.enqueue(Op::SetAttributeDeep {
            element,
            name: name.into(),
            value: value.into(),
        });
    }

    /// Queues adding a class.
    pub fn add_class(&mut self, element: ElementId, class: impl Into<String>) {
        self.enqueue(Op::AddToSet {
            element,
            set: Cow::Borrowed(CLASS_LIST),
            value: class.into(),
        });
    }

    /// Queues removing a class.
    pub fn remove_class(&mut self, element: ElementId, class: impl Into<String>) {
        self.enqueue(Op::RemoveFromSet {
            element,
            set: Cow::Borrowed(CLASS_LIST),
            value: class.into(),
        });
    }

    /// Queues appending `child` to `parent`.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.enqueue(Op::AppendChild { parent, child });
    }

    /// Queues inserting `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: ElementId, child: ElementId) {
        self.enqueue(Op::PrependChild { parent, child });
    }

    /// Queues inserting `child` before `reference` within `parent`.
    pub fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: ElementId) {
        self.enqueue(Op::InsertBefore {
            parent,
            child,
            reference,
        });
    }

    /// Queues removing `child` from `parent`.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) {
        self.enqueue(Op::RemoveChild { parent, child });
    }

    /// Number of queued operations.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The queued operations, oldest first.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &[Op] {
        &self.queue
    }

    /// The batch that ops queued now belong to.
    #[inline]
    #[must_use]
    pub fn batch(&self) -> u64 {
        self.batch
    }

    /// Returns `true` if the ops of `batch` were dropped by
    /// [`discard`](Self::discard) instead of being applied.
    #[must_use]
    pub fn is_discarded(&self, batch: u64) -> bool {
        self.discarded.contains(&batch)
    }

    /// Returns `true` if `element` was created in a discarded batch and so
    /// never reached the tree.
    #[must_use]
    pub fn is_lost(&self, element: ElementId) -> bool {
        self.lost.contains(&element)
    }

    /// Drops every queued operation without applying it and ends the batch.
    ///
    /// Used when a frame is abandoned, so its partial output never reaches
    /// the tree. Returns the number of operations dropped.
    pub fn discard(&mut self) -> usize {
        let ops = mem::take(&mut self.queue);
        let dropped = ops.len();
        self.mark_discarded(self.batch, ops);
        self.batch += 1;
        dropped
    }

    /// Applies every queued operation to `tree` in enqueue order and ends the
    /// batch.
    ///
    /// The queue is empty afterwards whether or not application succeeded.
    /// Returns the number of operations applied.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the tree. Later operations are
    /// dropped without being applied and the batch counts as discarded.
    pub fn flush<T: OutputTree + ?Sized>(&mut self, tree: &mut T) -> Result<usize, OutputError> {
        let batch = self.batch;
        self.batch += 1;
        let mut queue = mem::take(&mut self.queue);
        let mut ops = queue.drain(..);
        let mut applied = 0;
        let mut failure = None;
        while let Some(op) = ops.next() {
            let created = match &op {
                Op::CreateElement { element, .. } => Some(*element),
                _ => None,
            };
            if let Err(err) = tree.apply(op) {
                self.lost.extend(created);
                self.mark_discarded(batch, ops.by_ref());
                failure = Some(err);
                break;
            }
            applied += 1;
        }
        drop(ops);
        self.queue = queue;
        failure.map_or(Ok(applied), Err)
    }

    fn mark_discarded(&mut self, batch: u64, ops: impl IntoIterator<Item = Op>) {
        for op in ops {
            if let Op::CreateElement { element, .. } = op {
                self.lost.insert(element);
            }
        }
        self.discarded.insert(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTree;
    use kurbo::Size;

    #[test]
    fn ids_are_unique_and_monotonic() {
        let mut buf = OutputBuffer::new();
        let a = buf.reserve_element();
        let b = buf.create_element(ElementKind::DIV);
        assert!(a < b, "{a:?} {b:?}");
        assert_eq!(buf.len(), 1, "reserve does not enqueue");
    }

    #[test]
    fn flush_applies_in_enqueue_order() {
        let mut buf = OutputBuffer::new();
        let mut tree = MemoryTree::new();
        let root = buf.reserve_element();
        tree.mount(root, Size::new(100.0, 100.0));

        let a = buf.create_element(ElementKind::DIV);
        let b = buf.create_element(ElementKind::DIV);
        buf.append_child(root, a);
        buf.append_child(root, b);
        buf.set_style(a, "opacity", "0.5");
        buf.set_style(a, "opacity", "0.25");

        assert_eq!(buf.flush(&mut tree), Ok(6));
        assert!(buf.is_empty());
        assert_eq!(tree.children(root), &[a, b]);
        // Later writes win.
        assert_eq!(tree.style(a, "opacity"), Some("0.25"));
    }

    #[test]
    fn second_flush_is_a_no_op() {
        let mut buf = OutputBuffer::new();
        let mut tree = MemoryTree::new();
        buf.create_element(ElementKind::DIV);
        assert_eq!(buf.flush(&mut tree), Ok(1));
        assert_eq!(buf.flush(&mut tree), Ok(0));
        assert_eq!(tree.applied(), 1);
    }

    #[test]
    fn failed_flush_still_clears_queue() {
        let mut buf = OutputBuffer::new();
        let mut tree = MemoryTree::new();
        let ghost = ElementId(42);
        let batch = buf.batch();
        buf.set_style(ghost, "opacity", "1");
        let never = buf.create_element(ElementKind::DIV);

        assert_eq!(
            buf.flush(&mut tree),
            Err(OutputError::UnknownElement(ghost))
        );
        assert!(buf.is_empty());
        assert_eq!(tree.applied(), 0, "ops after the failure are dropped");
        assert!(buf.is_discarded(batch));
        assert!(buf.is_lost(never));
    }

    #[test]
    fn discard_drops_the_batch_and_remembers_created_ids() {
        let mut buf = OutputBuffer::new();
        let mut tree = MemoryTree::new();
        let root = buf.reserve_element();
        tree.mount(root, Size::new(10.0, 10.0));

        let kept = buf.create_element(ElementKind::DIV);
        buf.append_child(root, kept);
        let first = buf.batch();
        assert_eq!(buf.flush(&mut tree), Ok(2));
        assert!(!buf.is_discarded(first));

        let aborted = buf.batch();
        let dropped = buf.create_element(ElementKind::DIV);
        buf.set_style(kept, "color", "red");
        assert_eq!(buf.discard(), 2);
        assert!(buf.is_empty());
        assert!(buf.is_discarded(aborted));
        assert!(buf.is_lost(dropped));
        assert!(!buf.is_lost(kept));
        assert_ne!(buf.batch(), aborted, "discard ends the batch");

        buf.set_style(kept, "color", "blue");
        assert_eq!(buf.flush(&mut tree), Ok(1), "only the new batch is applied");
        assert_eq!(tree.style(kept, "color"), Some("blue"));
        assert!(tree.element(dropped).is_none());
    }
}
