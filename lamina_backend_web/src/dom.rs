// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM output tree.
//!
//! Applies buffered [`Op`]s to live DOM elements. Elements are addressed by
//! [`ElementId`]: ids reserved by the core's output buffer and either
//! created here on [`Op::CreateElement`] or supplied by the host through
//! [`DomTree::mount`].

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Size;
use lamina_core::OutputError;
use lamina_core::output::{CLASS_LIST, ElementId, Op, OutputTree, PropertyScope};
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, HtmlElement, Node};

use crate::properties::PropertyNames;

/// An [`OutputTree`] over `web_sys` elements.
pub struct DomTree {
    document: Document,
    elements: Vec<Option<Element>>,
    names: PropertyNames,
}

impl core::fmt::Debug for DomTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomTree")
            .field("document", &"Document")
            .field("elements_len", &self.elements.len())
            .field("names", &self.names)
            .finish()
    }
}

impl DomTree {
    /// Creates a tree that creates elements in `document`, detecting
    /// vendor-prefixed property names once.
    #[must_use]
    pub fn new(document: Document) -> Self {
        let names = PropertyNames::detect(&document);
        Self {
            document,
            elements: Vec::new(),
            names,
        }
    }

    /// Binds a host element (e.g. a context's container) to `id`.
    pub fn mount(&mut self, id: ElementId, host: HtmlElement) {
        self.put_element(id, host.unchecked_into());
    }

    /// Returns the DOM element for `id`, if known.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index()).and_then(Option::as_ref)
    }

    /// The detected property names.
    #[must_use]
    pub fn names(&self) -> &PropertyNames {
        &self.names
    }

    fn get(&self, id: ElementId) -> Result<&Element, OutputError> {
        self.element(id).ok_or(OutputError::UnknownElement(id))
    }

    fn put_element(&mut self, id: ElementId, el: Element) {
        let slot = id.index();
        if self.elements.len() <= slot {
            self.elements.resize_with(slot + 1, || None);
        }
        self.elements[slot] = Some(el);
    }

    fn assign(
        &self,
        element: ElementId,
        scope: PropertyScope,
        name: &str,
        value: &str,
    ) -> Result<(), OutputError> {
        let el = self.get(element)?;
        match scope {
            PropertyScope::Style => {
                let style = el
                    .dyn_ref::<HtmlElement>()
                    .ok_or_else(|| backend(format!("{element:?} has no inline style")))?
                    .style();
                let name = self.names.resolve(name);
                let result = if value.is_empty() {
                    style.remove_property(name).map(drop)
                } else {
                    style.set_property(name, value)
                };
                result.map_err(js_error)
            }
            PropertyScope::Element => {
                js_sys::Reflect::set(el, &JsValue::from_str(name), &JsValue::from_str(value))
                    .map(drop)
                    .map_err(js_error)
            }
        }
    }

    /// Calls `add`/`remove` on a set-like property such as `classList`.
    fn update_set(
        &self,
        element: ElementId,
        set: &str,
        method: &str,
        value: &str,
    ) -> Result<(), OutputError> {
        let el = self.get(element)?;
        if set == CLASS_LIST {
            let list = el.class_list();
            let result = if method == "add" {
                list.add_1(value)
            } else {
                list.remove_1(value)
            };
            return result.map_err(js_error);
        }
        let target = js_sys::Reflect::get(el, &JsValue::from_str(set)).map_err(js_error)?;
        let function = js_sys::Reflect::get(&target, &JsValue::from_str(method))
            .map_err(js_error)?
            .dyn_into::<js_sys::Function>()
            .map_err(|_| backend(format!("{set}.{method} is not a function")))?;
        function
            .call1(&target, &JsValue::from_str(value))
            .map(drop)
            .map_err(js_error)
    }
}

impl OutputTree for DomTree {
    fn apply(&mut self, op: Op) -> Result<(), OutputError> {
        match op {
            Op::CreateElement { element, kind } => {
                let el = self
                    .document
                    .create_element(kind.as_str())
                    .map_err(js_error)?;
                self.put_element(element, el);
                Ok(())
            }
            Op::AssignProperty {
                element,
                scope,
                name,
                value,
            } => self.assign(element, scope, &name, &value),
            Op::SetAttribute {
                element,
                name,
                value,
            } => self.get(element)?.set_attribute(&name, &value).map_err(js_error),
            Op::RemoveAttribute { element, name } => {
                self.get(element)?.remove_attribute(&name).map_err(js_error)
            }
            Op::AddToSet {
                element,
                set,
                value,
            } => self.update_set(element, &set, "add", &value),
            Op::RemoveFromSet {
                element,
                set,
                value,
            } => self.update_set(element, &set, "remove", &value),
            Op::AppendChild { parent, child } => {
                let parent = self.get(parent)?;
                parent.append_child(self.get(child)?).map(drop).map_err(js_error)
            }
            Op::PrependChild { parent, child } => {
                let parent = self.get(parent)?;
                let first = parent.first_child();
                parent
                    .insert_before(self.get(child)?, first.as_ref())
                    .map(drop)
                    .map_err(js_error)
            }
            Op::InsertBefore {
                parent,
                child,
                reference,
            } => {
                let parent = self.get(parent)?;
                let child = self.get(child)?;
                // A reference that is gone or moved elsewhere degrades to append.
                let reference: Option<&Node> = match self.element(reference) {
                    Some(r) if is_child_of(r, parent) => Some(&**r),
                    _ => None,
                };
                parent
                    .insert_before(child, reference)
                    .map(drop)
                    .map_err(js_error)
            }
            Op::RemoveChild { parent, child } => {
                let parent = self.get(parent)?;
                let child = self.get(child)?;
                if is_child_of(child, parent) {
                    parent.remove_child(child).map(drop).map_err(js_error)?;
                }
                Ok(())
            }
            Op::SetAttributeDeep {
                element,
                name,
                value,
            } => {
                let root = self.get(element)?;
                root.set_attribute(&name, &value).map_err(js_error)?;
                let all = root.query_selector_all("*").map_err(js_error)?;
                for i in 0..all.length() {
                    if let Some(node) = all.item(i)
                        && let Ok(el) = node.dyn_into::<Element>()
                    {
                        el.set_attribute(&name, &value).map_err(js_error)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn measure(&self, element: ElementId) -> Option<Size> {
        let rect = self.element(element)?.get_bounding_client_rect();
        Some(Size::new(rect.width(), rect.height()))
    }
}

fn is_child_of(child: &Node, parent: &Node) -> bool {
    child
        .parent_node()
        .is_some_and(|p| p.is_same_node(Some(parent)))
}

fn backend(message: String) -> OutputError {
    OutputError::Backend(message)
}

fn js_error(err: JsValue) -> OutputError {
    backend(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}
