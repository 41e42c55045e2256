// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diffed output state for one physical element.
//!
//! [`ElementOutput`] remembers the classes, inline styles, attributes and
//! content a surface wants, plus the placement it last wrote. Each commit
//! queues only what changed since then. If the batch holding the last write
//! was discarded, the next write starts over from a full attach.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Size;

use crate::buffer::OutputBuffer;
use crate::interpret::CommitContext;
use crate::output::{CONTENT_PROPERTY, ElementId, ElementKind};

/// Class added to every attached surface element.
pub const SURFACE_CLASS: &str = "lamina-surface";

/// Placement written at the last commit.
#[derive(Clone, Debug, PartialEq)]
struct Placement {
    transform: String,
    z_index: i32,
    opacity: f64,
    size: Option<Size>,
    hide: bool,
}

/// Desired element state and the diff bookkeeping to write it.
#[derive(Clone, Debug)]
pub struct ElementOutput {
    kind: ElementKind,
    classes: Vec<String>,
    removed_classes: Vec<String>,
    styles: BTreeMap<String, String>,
    removed_styles: Vec<String>,
    attributes: BTreeMap<String, String>,
    removed_attributes: Vec<String>,
    content: Option<String>,
    classes_dirty: bool,
    styles_dirty: bool,
    attributes_dirty: bool,
    content_dirty: bool,
    placement: Option<Placement>,
    /// Buffer batch of the last attach or write.
    synced: Option<u64>,
}

impl Default for ElementOutput {
    fn default() -> Self {
        Self::new(ElementKind::DIV)
    }
}

impl ElementOutput {
    /// Creates empty state for an element of `kind`.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            classes: Vec::new(),
            removed_classes: Vec::new(),
            styles: BTreeMap::new(),
            removed_styles: Vec::new(),
            attributes: BTreeMap::new(),
            removed_attributes: Vec::new(),
            content: None,
            classes_dirty: false,
            styles_dirty: false,
            attributes_dirty: false,
            content_dirty: false,
            placement: None,
            synced: None,
        }
    }

    /// The element type to allocate.
    #[must_use]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Desired classes, in insertion order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Adds a class.
    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if self.classes.contains(&class) {
            return;
        }
        self.removed_classes.retain(|c| *c != class);
        self.classes.push(class);
        self.classes_dirty = true;
    }

    /// Removes a class.
    pub fn remove_class(&mut self, class: &str) {
        let Some(pos) = self.classes.iter().position(|c| c == class) else {
            return;
        };
        let class = self.classes.remove(pos);
        self.removed_classes.push(class);
        self.classes_dirty = true;
    }

    /// Sets an inline style declaration.
    pub fn set_style(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.removed_styles.retain(|n| *n != name);
        self.styles.insert(name, value.into());
        self.styles_dirty = true;
    }

    /// Removes an inline style declaration.
    pub fn remove_style(&mut self, name: &str) {
        if let Some((name, _)) = self.styles.remove_entry(name) {
            self.removed_styles.push(name);
            self.styles_dirty = true;
        }
    }

    /// A desired inline style value.
    #[must_use]
    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(String::as_str)
    }

    /// Sets an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.removed_attributes.retain(|n| *n != name);
        self.attributes.insert(name, value.into());
        self.attributes_dirty = true;
    }

    /// Removes an attribute.
    pub fn remove_attribute(&mut self, name: &str) {
        if let Some((name, _)) = self.attributes.remove_entry(name) {
            self.removed_attributes.push(name);
            self.attributes_dirty = true;
        }
    }

    /// Sets the element's markup content.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
        self.content_dirty = true;
    }

    /// The desired markup content.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Returns `true` if something besides placement awaits writing.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.classes_dirty || self.styles_dirty || self.attributes_dirty || self.content_dirty
    }

    /// Prepares a freshly allocated (or reused) element and marks all state
    /// for writing on the next [`write`](Self::write).
    pub fn attach(&mut self, element: ElementId, buffer: &mut OutputBuffer) {
        buffer.add_class(element, SURFACE_CLASS);
        buffer.set_style(element, "position", "absolute");
        buffer.set_style(element, "left", "0");
        buffer.set_style(element, "top", "0");
        buffer.set_style(element, "transform-origin", "0% 0%");
        buffer.set_style(element, "display", "");
        self.removed_classes.clear();
        self.removed_styles.clear();
        self.removed_attributes.clear();
        self.classes_dirty = true;
        self.styles_dirty = true;
        self.attributes_dirty = true;
        self.content_dirty = self.content.is_some();
        self.placement = None;
        self.synced = Some(buffer.batch());
    }

    /// Queues every change since the last write.
    ///
    /// The transform is shifted by `-origin * size` so the origin point lands
    /// on the resolved position; the CSS transform origin stays at the top
    /// left corner.
    pub fn write(
        &mut self,
        element: ElementId,
        context: &CommitContext,
        size: Option<Size>,
        buffer: &mut OutputBuffer,
    ) {
        if self.synced.is_some_and(|batch| buffer.is_discarded(batch)) {
            self.attach(element, buffer);
        }
        self.synced = Some(buffer.batch());

        let extent = size.unwrap_or(Size::ZERO);
        let transform = context.transform.move_then([
            -extent.width * context.origin.x,
            -extent.height * context.origin.y,
            0.0,
        ]);
        let next = Placement {
            transform: transform.to_css_matrix3d(),
            z_index: rounded(context.transform.translation()[2]),
            opacity: context.opacity,
            size,
            hide: context.hide,
        };
        let prev = self.placement.take();
        let prev = prev.as_ref();

        if prev.map(|p| &p.transform) != Some(&next.transform) {
            buffer.set_style(element, "transform", next.transform.clone());
        }
        if prev.map(|p| p.z_index) != Some(next.z_index) {
            buffer.set_style(element, "z-index", format!("{}", next.z_index));
        }
        if prev.map(|p| p.opacity) != Some(next.opacity) {
            buffer.set_style(element, "opacity", format!("{}", next.opacity));
        }
        if prev.map(|p| p.hide) != Some(next.hide) {
            buffer.set_style(element, "visibility", if next.hide { "hidden" } else { "" });
        }
        if let Some(size) = next.size
            && prev.and_then(|p| p.size) != Some(size)
        {
            buffer.set_style(element, "width", format!("{}px", size.width));
            buffer.set_style(element, "height", format!("{}px", size.height));
        }
        self.placement = Some(next);

        self.write_state(element, buffer);
    }

    fn write_state(&mut self, element: ElementId, buffer: &mut OutputBuffer) {
        if self.classes_dirty {
            for class in self.removed_classes.drain(..) {
                buffer.remove_class(element, class);
            }
            for class in &self.classes {
                buffer.add_class(element, class.clone());
            }
            self.classes_dirty = false;
        }
        if self.styles_dirty {
            for name in self.removed_styles.drain(..) {
                buffer.set_style(element, name, "");
            }
            for (name, value) in &self.styles {
                buffer.set_style(element, name.clone(), value.clone());
            }
            self.styles_dirty = false;
        }
        if self.attributes_dirty {
            for name in self.removed_attributes.drain(..) {
                buffer.remove_attribute(element, name);
            }
            for (name, value) in &self.attributes {
                buffer.set_attribute(element, name.clone(), value.clone());
            }
            self.attributes_dirty = false;
        }
        if self.content_dirty {
            if let Some(content) = &self.content {
                buffer.set_property(element, CONTENT_PROPERTY, content.clone());
            }
            self.content_dirty = false;
        }
    }

    /// Strips the element back to a poolable state: classes removed, content
    /// cleared, display off.
    pub fn detach(&mut self, element: ElementId, buffer: &mut OutputBuffer) {
        for class in self.classes.iter().chain(&self.removed_classes) {
            buffer.remove_class(element, class.clone());
        }
        buffer.remove_class(element, SURFACE_CLASS);
        self.removed_classes.clear();
        if self.content.is_some() {
            buffer.set_property(element, CONTENT_PROPERTY, "");
        }
        buffer.set_style(element, "display", "none");
        self.placement = None;
        self.synced = None;
    }
}

/// Rounds half away from zero.
#[expect(
    clippy::cast_possible_truncation,
    reason = "z translations are small; out-of-range values saturate"
)]
fn rounded(z: f64) -> i32 {
    if z >= 0.0 {
        (z + 0.5) as i32
    } else {
        (z - 0.5) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTree;
    use crate::transform::Transform3d;
    use kurbo::Vec2;

    fn mounted() -> (ElementId, OutputBuffer, MemoryTree) {
        let mut buffer = OutputBuffer::new();
        let mut tree = MemoryTree::new();
        let element = buffer.reserve_element();
        tree.mount(element, Size::new(10.0, 10.0));
        (element, buffer, tree)
    }

    #[test]
    fn first_write_emits_everything_then_nothing() {
        let (el, mut buffer, mut tree) = mounted();
        let mut out = ElementOutput::default();
        out.add_class("card");
        out.set_style("color", "red");
        out.set_attribute("role", "button");
        out.set_content("<b>hi</b>");

        let ctx = CommitContext::with_size(Size::new(50.0, 20.0));
        out.attach(el, &mut buffer);
        out.write(el, &ctx, ctx.size, &mut buffer);
        buffer.flush(&mut tree).unwrap();

        assert!(tree.set_contains(el, "classList", SURFACE_CLASS));
        assert!(tree.set_contains(el, "classList", "card"));
        assert_eq!(tree.style(el, "color"), Some("red"));
        assert_eq!(tree.style(el, "width"), Some("50px"));
        assert_eq!(tree.attribute(el, "role"), Some("button"));
        assert_eq!(tree.property(el, CONTENT_PROPERTY), Some("<b>hi</b>"));
        assert!(!out.is_dirty());

        out.write(el, &ctx, ctx.size, &mut buffer);
        assert!(buffer.is_empty(), "unchanged state writes nothing");
    }

    #[test]
    fn origin_shifts_transform() {
        let (el, mut buffer, mut tree) = mounted();
        let mut out = ElementOutput::default();
        let ctx = CommitContext {
            origin: Vec2::new(0.5, 0.5),
            ..CommitContext::with_size(Size::new(100.0, 40.0))
        };
        out.attach(el, &mut buffer);
        out.write(el, &ctx, ctx.size, &mut buffer);
        buffer.flush(&mut tree).unwrap();
        assert_eq!(
            tree.style(el, "transform"),
            Some(Transform3d::from_translation(-50.0, -20.0, 0.0).to_css_matrix3d().as_str())
        );
    }

    #[test]
    fn only_changed_placement_is_written() {
        let (el, mut buffer, mut tree) = mounted();
        let mut out = ElementOutput::default();
        let mut ctx = CommitContext::ROOT;
        out.attach(el, &mut buffer);
        out.write(el, &ctx, None, &mut buffer);
        buffer.flush(&mut tree).unwrap();

        ctx.opacity = 0.25;
        out.write(el, &ctx, None, &mut buffer);
        assert_eq!(buffer.len(), 1, "only opacity changed");
        buffer.flush(&mut tree).unwrap();
        assert_eq!(tree.style(el, "opacity"), Some("0.25"));
    }

    #[test]
    fn z_index_ignores_the_origin_shift() {
        let (el, mut buffer, mut tree) = mounted();
        let mut out = ElementOutput::default();
        // Turning about y maps the x origin offset onto z.
        let ctx = CommitContext {
            transform: Transform3d::from_rotation_y(core::f64::consts::FRAC_PI_2)
                .then_move([0.0, 0.0, 3.0]),
            origin: Vec2::new(0.5, 0.0),
            ..CommitContext::with_size(Size::new(100.0, 40.0))
        };
        out.attach(el, &mut buffer);
        out.write(el, &ctx, ctx.size, &mut buffer);
        buffer.flush(&mut tree).unwrap();
        assert_eq!(tree.style(el, "z-index"), Some("3"));
    }

    #[test]
    fn discarded_write_is_replayed_in_full() {
        let (el, mut buffer, mut tree) = mounted();
        let mut out = ElementOutput::default();
        out.add_class("card");
        out.attach(el, &mut buffer);
        out.write(el, &CommitContext::ROOT, None, &mut buffer);
        buffer.flush(&mut tree).unwrap();

        out.set_style("color", "red");
        let moved = CommitContext {
            opacity: 0.5,
            ..CommitContext::ROOT
        };
        out.write(el, &moved, None, &mut buffer);
        buffer.discard();
        assert_eq!(tree.style(el, "color"), None);

        out.write(el, &moved, None, &mut buffer);
        buffer.flush(&mut tree).unwrap();
        assert_eq!(tree.style(el, "color"), Some("red"));
        assert_eq!(tree.style(el, "opacity"), Some("0.5"));
        assert!(tree.set_contains(el, "classList", "card"));
    }

    #[test]
    fn z_translation_becomes_z_index() {
        assert_eq!(rounded(2.4), 2);
        assert_eq!(rounded(2.5), 3);
        assert_eq!(rounded(-2.5), -3);
        assert_eq!(rounded(0.0), 0);
    }

    #[test]
    fn removals_are_written_then_forgotten() {
        let (el, mut buffer, mut tree) = mounted();
        let mut out = ElementOutput::default();
        out.add_class("a");
        out.set_style("color", "red");
        out.set_attribute("title", "t");
        out.attach(el, &mut buffer);
        out.write(el, &CommitContext::ROOT, None, &mut buffer);
        buffer.flush(&mut tree).unwrap();

        out.remove_class("a");
        out.remove_style("color");
        out.remove_attribute("title");
        out.write(el, &CommitContext::ROOT, None, &mut buffer);
        buffer.flush(&mut tree).unwrap();
        assert!(!tree.set_contains(el, "classList", "a"));
        assert_eq!(tree.style(el, "color"), None);
        assert_eq!(tree.attribute(el, "title"), None);

        out.write(el, &CommitContext::ROOT, None, &mut buffer);
        assert!(buffer.is_empty());
    }

    #[test]
    fn detach_strips_the_element() {
        let (el, mut buffer, mut tree) = mounted();
        let mut out = ElementOutput::default();
        out.add_class("a");
        out.set_content("x");
        out.attach(el, &mut buffer);
        out.write(el, &CommitContext::ROOT, None, &mut buffer);
        out.detach(el, &mut buffer);
        buffer.flush(&mut tree).unwrap();
        assert!(!tree.set_contains(el, "classList", "a"));
        assert!(!tree.set_contains(el, "classList", SURFACE_CLASS));
        assert_eq!(tree.property(el, CONTENT_PROPERTY), Some(""));
        assert_eq!(tree.style(el, "display"), Some("none"));
        assert_eq!(out.classes(), ["a"], "desired state survives detach");
    }
}
