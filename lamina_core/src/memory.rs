// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory [`OutputTree`] for headless runs and tests.
//!
//! Elements live in an ordered map keyed by [`ElementId`]. Operations follow
//! DOM semantics closely enough to check what a frame would have done to a
//! real document: appending a child moves it, removing a child that has
//! moved is a no-op, and empty style assignments remove the declaration.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Size;

use crate::error::OutputError;
use crate::output::{ElementId, ElementKind, Op, OutputTree, PropertyScope};

/// One element in a [`MemoryTree`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryElement {
    /// Element type; `None` for mount points supplied by the host.
    pub kind: Option<ElementKind>,
    /// Current parent.
    pub parent: Option<ElementId>,
    /// Children in document order.
    pub children: Vec<ElementId>,
    /// Inline style declarations.
    pub style: BTreeMap<String, String>,
    /// Element properties.
    pub properties: BTreeMap<String, String>,
    /// Attributes.
    pub attributes: BTreeMap<String, String>,
    /// Set-like collections such as `classList`, in insertion order.
    pub sets: BTreeMap<String, Vec<String>>,
    /// Size reported by [`OutputTree::measure`].
    pub size: Option<Size>,
}

/// A detached element tree held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryTree {
    elements: BTreeMap<ElementId, MemoryElement>,
    applied: usize,
}

impl MemoryTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `id` to a new root element of the given measured size.
    pub fn mount(&mut self, id: ElementId, size: Size) {
        self.elements.insert(
            id,
            MemoryElement {
                size: Some(size),
                ..MemoryElement::default()
            },
        );
    }

    /// Changes the size [`measure`](OutputTree::measure) reports for `id`.
    pub fn set_measured_size(&mut self, id: ElementId, size: Size) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.size = Some(size);
        }
    }

    /// Returns an element.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&MemoryElement> {
        self.elements.get(&id)
    }

    /// Children of `id`, or an empty slice if unknown.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements.get(&id).map_or(&[], |e| e.children.as_slice())
    }

    /// An inline style value.
    #[must_use]
    pub fn style(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements.get(&id)?.style.get(name).map(String::as_str)
    }

    /// An element property value.
    #[must_use]
    pub fn property(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements.get(&id)?.properties.get(name).map(String::as_str)
    }

    /// An attribute value.
    #[must_use]
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements.get(&id)?.attributes.get(name).map(String::as_str)
    }

    /// Returns `true` if `value` is in the named set of `id`.
    #[must_use]
    pub fn set_contains(&self, id: ElementId, set: &str, value: &str) -> bool {
        self.elements
            .get(&id)
            .and_then(|e| e.sets.get(set))
            .is_some_and(|members| members.iter().any(|m| m == value))
    }

    /// Number of elements, mount points included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if nothing has been mounted or created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total number of operations applied successfully.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.applied
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut MemoryElement, OutputError> {
        self.elements
            .get_mut(&id)
            .ok_or(OutputError::UnknownElement(id))
    }

    fn ensure(&self, id: ElementId) -> Result<(), OutputError> {
        if self.elements.contains_key(&id) {
            Ok(())
        } else {
            Err(OutputError::UnknownElement(id))
        }
    }

    fn detach(&mut self, child: ElementId) {
        let Some(old_parent) = self.elements.get_mut(&child).and_then(|c| c.parent.take()) else {
            return;
        };
        if let Some(parent) = self.elements.get_mut(&old_parent) {
            parent.children.retain(|c| *c != child);
        }
    }

    fn insert_child(
        &mut self,
        parent: ElementId,
        child: ElementId,
        position: impl FnOnce(&[ElementId]) -> usize,
    ) -> Result<(), OutputError> {
        self.ensure(parent)?;
        self.ensure(child)?;
        self.detach(child);
        let p = self.get_mut(parent)?;
        let at = position(&p.children).min(p.children.len());
        p.children.insert(at, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(e) = self.elements.get(&id) {
                stack.extend(e.children.iter().rev().copied());
            }
        }
        out
    }
}

impl OutputTree for MemoryTree {
    fn apply(&mut self, op: Op) -> Result<(), OutputError> {
        match op {
            Op::CreateElement { element, kind } => {
                self.elements.insert(
                    element,
                    MemoryElement {
                        kind: Some(kind),
                        ..MemoryElement::default()
                    },
                );
            }
            Op::AssignProperty {
                element,
                scope,
                name,
                value,
            } => {
                let e = self.get_mut(element)?;
                let map = match scope {
                    PropertyScope::Style => &mut e.style,
                    PropertyScope::Element => &mut e.properties,
                };
                if value.is_empty() && scope == PropertyScope::Style {
                    map.remove(name.as_ref());
                } else {
                    map.insert(name.into_owned(), value);
                }
            }
            Op::SetAttribute {
                element,
                name,
                value,
            } => {
                self.get_mut(element)?
                    .attributes
                    .insert(name.into_owned(), value);
            }
            Op::RemoveAttribute { element, name } => {
                self.get_mut(element)?.attributes.remove(name.as_ref());
            }
            Op::AddToSet {
                element,
                set,
                value,
            } => {
                let members = self.get_mut(element)?.sets.entry(set.into_owned()).or_default();
                if !members.contains(&value) {
                    members.push(value);
                }
            }
            Op::RemoveFromSet {
                element,
                set,
                value,
            } => {
                if let Some(members) = self.get_mut(element)?.sets.get_mut(set.as_ref()) {
                    members.retain(|m| *m != value);
                }
            }
            Op::AppendChild { parent, child } => {
                self.insert_child(parent, child, <[ElementId]>::len)?;
            }
            Op::PrependChild { parent, child } => {
                self.insert_child(parent, child, |_| 0)?;
            }
            Op::InsertBefore {
                parent,
                child,
                reference,
            } => {
                self.insert_child(parent, child, |children| {
                    children
                        .iter()
                        .position(|c| *c == reference)
                        .unwrap_or(children.len())
                })?;
            }
            Op::RemoveChild { parent, child } => {
                self.ensure(parent)?;
                if self.get_mut(child)?.parent == Some(parent) {
                    self.detach(child);
                }
            }
            Op::SetAttributeDeep {
                element,
                name,
                value,
            } => {
                self.ensure(element)?;
                for id in self.descendants(element) {
                    self.get_mut(id)?
                        .attributes
                        .insert(String::from(name.as_ref()), value.clone());
                }
            }
        }
        self.applied += 1;
        Ok(())
    }

    fn measure(&self, element: ElementId) -> Option<Size> {
        self.elements.get(&element)?.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::OutputBuffer;
    use crate::output::CLASS_LIST;

    fn mounted() -> (MemoryTree, OutputBuffer, ElementId) {
        let mut tree = MemoryTree::new();
        let mut buffer = OutputBuffer::new();
        let root = buffer.reserve_element();
        tree.mount(root, Size::new(320.0, 240.0));
        (tree, buffer, root)
    }

    #[test]
    fn append_then_set_attribute_in_order() {
        let (mut tree, mut buffer, root) = mounted();
        let x = buffer.create_element(ElementKind::DIV);
        buffer.append_child(root, x);
        buffer.set_attribute(x, "class", "c");
        buffer.flush(&mut tree).unwrap();

        assert_eq!(tree.children(root), &[x]);
        assert_eq!(tree.element(x).unwrap().parent, Some(root));
        assert_eq!(tree.attribute(x, "class"), Some("c"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn append_moves_between_parents() {
        let (mut tree, mut buffer, root) = mounted();
        let a = buffer.create_element(ElementKind::DIV);
        let b = buffer.create_element(ElementKind::DIV);
        let x = buffer.create_element(ElementKind::DIV);
        buffer.append_child(root, a);
        buffer.append_child(root, b);
        buffer.append_child(a, x);
        buffer.append_child(b, x);
        buffer.flush(&mut tree).unwrap();
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[x]);
    }

    #[test]
    fn insert_before_and_prepend() {
        let (mut tree, mut buffer, root) = mounted();
        let a = buffer.create_element(ElementKind::DIV);
        let b = buffer.create_element(ElementKind::DIV);
        let c = buffer.create_element(ElementKind::DIV);
        buffer.append_child(root, a);
        buffer.insert_before(root, b, a);
        buffer.prepend_child(root, c);
        buffer.flush(&mut tree).unwrap();
        assert_eq!(tree.children(root), &[c, b, a]);
    }

    #[test]
    fn double_remove_is_tolerated() {
        let (mut tree, mut buffer, root) = mounted();
        let x = buffer.create_element(ElementKind::DIV);
        buffer.append_child(root, x);
        buffer.remove_child(root, x);
        buffer.remove_child(root, x);
        assert_eq!(buffer.flush(&mut tree), Ok(4));
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn empty_style_value_removes_declaration() {
        let (mut tree, mut buffer, root) = mounted();
        buffer.set_style(root, "perspective", "500px");
        buffer.flush(&mut tree).unwrap();
        assert_eq!(tree.style(root, "perspective"), Some("500px"));
        buffer.set_style(root, "perspective", "");
        buffer.flush(&mut tree).unwrap();
        assert_eq!(tree.style(root, "perspective"), None);
    }

    #[test]
    fn class_set_ignores_duplicates() {
        let (mut tree, mut buffer, root) = mounted();
        buffer.add_class(root, "a");
        buffer.add_class(root, "a");
        buffer.add_class(root, "b");
        buffer.remove_class(root, "a");
        buffer.flush(&mut tree).unwrap();
        assert!(!tree.set_contains(root, CLASS_LIST, "a"));
        assert!(tree.set_contains(root, CLASS_LIST, "b"));
    }

    #[test]
    fn deep_attribute_reaches_all_descendants() {
        let (mut tree, mut buffer, root) = mounted();
        let a = buffer.create_element(ElementKind::DIV);
        let b = buffer.create_element(ElementKind::DIV);
        buffer.append_child(root, a);
        buffer.append_child(a, b);
        buffer.set_attribute_deep(a, "aria-hidden", "true");
        buffer.flush(&mut tree).unwrap();
        assert_eq!(tree.attribute(a, "aria-hidden"), Some("true"));
        assert_eq!(tree.attribute(b, "aria-hidden"), Some("true"));
        assert_eq!(tree.attribute(root, "aria-hidden"), None);
    }

    #[test]
    fn measure_reports_mounted_size() {
        let (mut tree, _, root) = mounted();
        assert_eq!(tree.measure(root), Some(Size::new(320.0, 240.0)));
        tree.set_measured_size(root, Size::new(10.0, 10.0));
        assert_eq!(tree.measure(root), Some(Size::new(10.0, 10.0)));
    }
}
