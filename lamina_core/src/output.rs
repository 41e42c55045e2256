// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output element handles, the closed set of tree operations, and the
//! [`OutputTree`] trait backends implement.
//!
//! Core code never touches a physical tree. Entities and allocators address
//! elements through opaque [`ElementId`]s and describe every mutation as an
//! [`Op`]; the [`OutputBuffer`](crate::buffer::OutputBuffer) queues those ops
//! and a backend applies them at flush time.

use alloc::borrow::Cow;
use alloc::string::String;
use core::fmt;

use kurbo::Size;

use crate::error::OutputError;

/// Opaque handle to a physical output element (a DOM node on the web).
///
/// Ids are handed out by the [`OutputBuffer`](crate::buffer::OutputBuffer)
/// and stay bound to the same element for the life of the tree. Backends map
/// ids to their native objects.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u32);

impl ElementId {
    /// Returns the raw index, suitable for slot-vector lookups in backends.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

/// Element type, e.g. `div` or `img`.
///
/// Tags are stored lowercase; the allocator pools free elements per kind.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementKind(Cow<'static, str>);

impl ElementKind {
    /// A generic block container.
    pub const DIV: Self = Self(Cow::Borrowed("div"));

    /// Creates a kind from a tag name, lowercasing it.
    #[must_use]
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        let tag = tag.into();
        if tag.bytes().any(|b| b.is_ascii_uppercase()) {
            Self(Cow::Owned(tag.to_ascii_lowercase()))
        } else {
            Self(tag)
        }
    }

    /// Returns the tag name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementKind {
    fn default() -> Self {
        Self::DIV
    }
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// Where an [`Op::AssignProperty`] lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyScope {
    /// An inline style declaration (`element.style`). Assigning an empty
    /// string removes the declaration.
    Style,
    /// A property of the element object itself (e.g. `innerHTML`).
    Element,
}

/// Name of the class set manipulated by [`Op::AddToSet`] / [`Op::RemoveFromSet`].
pub const CLASS_LIST: &str = "classList";

/// Name of the element property that holds a surface's content.
pub const CONTENT_PROPERTY: &str = "innerHTML";

/// A single deferred mutation of the output tree.
///
/// The set is closed: backends must handle every variant, so there is no
/// "unknown operation" failure mode at flush time.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Creates a detached element of `kind` and binds it to `element`.
    CreateElement {
        /// Id the new element is bound to.
        element: ElementId,
        /// Element type.
        kind: ElementKind,
    },
    /// Assigns a style declaration or element property.
    AssignProperty {
        /// Target element.
        element: ElementId,
        /// Style declaration or element property.
        scope: PropertyScope,
        /// Property name.
        name: Cow<'static, str>,
        /// New value.
        value: String,
    },
    /// Sets an attribute.
    SetAttribute {
        /// Target element.
        element: ElementId,
        /// Attribute name.
        name: Cow<'static, str>,
        /// Attribute value.
        value: String,
    },
    /// Removes an attribute.
    RemoveAttribute {
        /// Target element.
        element: ElementId,
        /// Attribute name.
        name: Cow<'static, str>,
    },
    /// Adds `value` to a set-like collection such as `classList`.
    AddToSet {
        /// Target element.
        element: ElementId,
        /// Collection name.
        set: Cow<'static, str>,
        /// Member to add.
        value: String,
    },
    /// Removes `value` from a set-like collection.
    RemoveFromSet {
        /// Target element.
        element: ElementId,
        /// Collection name.
        set: Cow<'static, str>,
        /// Member to remove.
        value: String,
    },
    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent.
    AppendChild {
        /// New parent.
        parent: ElementId,
        /// Element to insert.
        child: ElementId,
    },
    /// Inserts `child` as the first child of `parent`.
    PrependChild {
        /// New parent.
        parent: ElementId,
        /// Element to insert.
        child: ElementId,
    },
    /// Inserts `child` into `parent` immediately before `reference`.
    ///
    /// If `reference` is not a child of `parent` the child is appended.
    InsertBefore {
        /// New parent.
        parent: ElementId,
        /// Element to insert.
        child: ElementId,
        /// Sibling to insert in front of.
        reference: ElementId,
    },
    /// Removes `child` from `parent`. A no-op if `child` has already moved.
    RemoveChild {
        /// Expected parent.
        parent: ElementId,
        /// Element to remove.
        child: ElementId,
    },
    /// Sets an attribute on `element` and every descendant.
    SetAttributeDeep {
        /// Subtree root.
        element: ElementId,
        /// Attribute name.
        name: Cow<'static, str>,
        /// Attribute value.
        value: String,
    },
}

impl Op {
    /// Returns the element the operation primarily targets (the parent for
    /// tree-structure operations).
    #[must_use]
    pub const fn target(&self) -> ElementId {
        match self {
            Self::CreateElement { element, .. }
            | Self::AssignProperty { element, .. }
            | Self::SetAttribute { element, .. }
            | Self::RemoveAttribute { element, .. }
            | Self::AddToSet { element, .. }
            | Self::RemoveFromSet { element, .. }
            | Self::SetAttributeDeep { element, .. } => *element,
            Self::AppendChild { parent, .. }
            | Self::PrependChild { parent, .. }
            | Self::InsertBefore { parent, .. }
            | Self::RemoveChild { parent, .. } => *parent,
        }
    }
}

/// A physical output tree that can apply [`Op`]s and measure elements.
///
/// Implemented by `lamina_backend_web::DomTree` for the browser DOM and by
/// [`MemoryTree`](crate::memory::MemoryTree) for headless use and tests.
pub trait OutputTree {
    /// Applies one operation.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::UnknownElement`] if an id was never bound in
    /// this tree, or [`OutputError::Backend`] if the native tree rejected the
    /// mutation.
    fn apply(&mut self, op: Op) -> Result<(), OutputError>;

    /// Measures the laid-out size of an element, if the tree knows it.
    fn measure(&self, element: ElementId) -> Option<Size>;
}
