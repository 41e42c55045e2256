// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surfaces: entities that own exactly one physical element.

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use kurbo::Size;

use crate::entity::{Commit, CommitScope, Entity, EntityId, EntityRegistry};
use crate::element::ElementOutput;
use crate::error::Error;
use crate::interpret::CommitContext;
use crate::modifier::Axes;
use crate::output::{ElementId, ElementKind};
use crate::renderable::Renderable;
use crate::spec::RenderSpec;

/// Fills unset axes of `explicit` from `available`.
///
/// Returns `None` when an axis is set nowhere.
#[must_use]
pub fn resolve_size(explicit: Option<Axes>, available: Option<Size>) -> Option<Size> {
    let [w, h] = explicit.unwrap_or([None, None]);
    Some(Size::new(
        w.or(available.map(|s| s.width))?,
        h.or(available.map(|s| s.height))?,
    ))
}

/// A leaf entity drawing one element with classes, styles, attributes and
/// content.
///
/// The element is allocated on first commit and returned to the pool on
/// cleanup; a surface that comes back gets a (possibly recycled) element
/// and rewrites all of its state.
#[derive(Debug)]
pub struct Surface {
    id: EntityId,
    output: ElementOutput,
    element: Option<ElementId>,
    size: Option<Axes>,
    available: Option<Size>,
}

impl Surface {
    /// Registers a `<div>` surface.
    pub fn new(registry: &mut EntityRegistry) -> Rc<RefCell<Self>> {
        Self::with_kind(registry, ElementKind::DIV)
    }

    /// Registers a surface drawing an element of `kind`.
    pub fn with_kind(registry: &mut EntityRegistry, kind: ElementKind) -> Rc<RefCell<Self>> {
        registry.register_with(|id| Self {
            id,
            output: ElementOutput::new(kind),
            element: None,
            size: None,
            available: None,
        })
    }

    /// The surface's entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The element currently drawn into, if committed.
    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    /// The desired element state.
    #[must_use]
    pub fn output(&self) -> &ElementOutput {
        &self.output
    }

    /// Sets an explicit size; unset axes follow the context.
    pub fn set_size(&mut self, size: Option<Axes>) {
        self.size = size;
    }

    /// Adds a CSS class.
    pub fn add_class(&mut self, class: impl Into<String>) {
        self.output.add_class(class);
    }

    /// Removes a CSS class.
    pub fn remove_class(&mut self, class: &str) {
        self.output.remove_class(class);
    }

    /// Sets an inline style.
    pub fn set_style(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.output.set_style(name, value);
    }

    /// Removes an inline style.
    pub fn remove_style(&mut self, name: &str) {
        self.output.remove_style(name);
    }

    /// Sets an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.output.set_attribute(name, value);
    }

    /// Removes an attribute.
    pub fn remove_attribute(&mut self, name: &str) {
        self.output.remove_attribute(name);
    }

    /// Sets the markup content.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.output.set_content(content);
    }
}

impl Renderable for Surface {
    fn render(&self) -> RenderSpec {
        RenderSpec::Entity(self.id)
    }

    fn size(&self) -> Option<Size> {
        resolve_size(self.size, self.available)
    }
}

impl Entity for Surface {
    fn commit(
        &mut self,
        context: &CommitContext,
        scope: &mut CommitScope<'_>,
    ) -> Result<Commit, Error> {
        if let Some(element) = self.element
            && scope.buffer.is_lost(element)
        {
            scope.allocator.forget(element);
            self.element = None;
        }
        let element = match self.element {
            Some(element) => element,
            None => {
                let element = scope
                    .allocator
                    .allocate_element(self.output.kind().clone(), scope.buffer);
                self.output.attach(element, scope.buffer);
                self.element = Some(element);
                element
            }
        };
        self.available = context.size;
        let size = resolve_size(self.size, context.size);
        self.output.write(element, context, size, scope.buffer);
        Ok(Commit::Terminal)
    }

    fn cleanup(&mut self, scope: &mut CommitScope<'_>) -> Result<(), Error> {
        if let Some(element) = self.element.take() {
            if scope.buffer.is_lost(element) {
                scope.allocator.forget(element);
                return Ok(());
            }
            self.output.detach(element, scope.buffer);
            scope.allocator.deallocate(element);
        }
        Ok(())
    }
}
