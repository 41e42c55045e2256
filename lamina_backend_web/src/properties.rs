// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Startup detection of vendor-prefixed style property names.
//!
//! Core code always writes the standard names (`transform`,
//! `transform-origin`, `perspective`). [`PropertyNames`] maps them to what
//! the running engine understands, once, so the per-op path is a lookup.

use wasm_bindgen::JsValue;
use web_sys::{Document, HtmlElement};

/// Resolved names for the style properties that have historically needed a
/// vendor prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyNames {
    /// Name to use for `transform`.
    pub transform: &'static str,
    /// Name to use for `transform-origin`.
    pub transform_origin: &'static str,
    /// Name to use for `perspective`.
    pub perspective: &'static str,
}

/// Candidates per property: script-side name looked up on a style object, and
/// the declaration name to write when it is present.
const TRANSFORM: [(&str, &str); 2] = [
    ("transform", "transform"),
    ("webkitTransform", "-webkit-transform"),
];
const TRANSFORM_ORIGIN: [(&str, &str); 2] = [
    ("transformOrigin", "transform-origin"),
    ("webkitTransformOrigin", "-webkit-transform-origin"),
];
const PERSPECTIVE: [(&str, &str); 2] = [
    ("perspective", "perspective"),
    ("webkitPerspective", "-webkit-perspective"),
];

impl PropertyNames {
    /// Unprefixed names.
    pub const STANDARD: Self = Self {
        transform: "transform",
        transform_origin: "transform-origin",
        perspective: "perspective",
    };

    /// Picks the first supported candidate per property, falling back to
    /// the standard name.
    #[must_use]
    pub fn from_support(supports: impl Fn(&str) -> bool) -> Self {
        let pick = |candidates: &[(&'static str, &'static str); 2]| {
            candidates
                .iter()
                .find(|(script, _)| supports(script))
                .map_or(candidates[0].1, |(_, css)| *css)
        };
        Self {
            transform: pick(&TRANSFORM),
            transform_origin: pick(&TRANSFORM_ORIGIN),
            perspective: pick(&PERSPECTIVE),
        }
    }

    /// Checks the document element's style object.
    ///
    /// Documents without an HTML root element get [`STANDARD`](Self::STANDARD).
    #[must_use]
    pub fn detect(document: &Document) -> Self {
        use wasm_bindgen::JsCast as _;

        let Some(style) = document
            .document_element()
            .and_then(|root| root.dyn_into::<HtmlElement>().ok())
            .map(|root| root.style())
        else {
            return Self::STANDARD;
        };
        Self::from_support(|script| {
            js_sys::Reflect::has(&style, &JsValue::from_str(script)).unwrap_or(false)
        })
    }

    /// Maps a standard declaration name to the detected one.
    #[must_use]
    pub fn resolve<'a>(&self, name: &'a str) -> &'a str {
        match name {
            "transform" => self.transform,
            "transform-origin" => self.transform_origin,
            "perspective" => self.perspective,
            other => other,
        }
    }
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self::STANDARD
    }
}
