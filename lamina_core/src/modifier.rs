// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value sources and the state [`Modifier`].
//!
//! A [`Modifier`] attaches placement state to whatever its render node's
//! child renders, without being visible itself. Each property is backed by a
//! [`ValueSource`]: a constant, a closure, or an external interpolator that
//! reports whether it is mid-transition.

use alloc::boxed::Box;
use core::fmt;

use kurbo::Vec2;

use crate::renderable::Modify;
use crate::spec::{RenderSpec, SpecNode};
use crate::transform::Transform3d;

/// A getter for a value that may change every frame.
pub trait ValueSource<T> {
    /// Returns the current value.
    fn get(&self) -> T;

    /// Returns `true` while the value is animating.
    fn is_active(&self) -> bool {
        false
    }
}

/// A value that never changes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Constant<T>(pub T);

impl<T: Clone> ValueSource<T> for Constant<T> {
    fn get(&self) -> T {
        self.0.clone()
    }
}

impl<T, F: Fn() -> T> ValueSource<T> for F {
    fn get(&self) -> T {
        self()
    }
}

type Source<T> = Option<Box<dyn ValueSource<T>>>;

/// Per-axis optional lengths or factors.
pub type Axes = [Option<f64>; 2];

/// Attaches transform, opacity, origin, align, size, proportions and hide
/// state to a subtree.
#[derive(Default)]
pub struct Modifier {
    transform: Source<Transform3d>,
    opacity: Source<f64>,
    origin: Source<Vec2>,
    align: Source<Vec2>,
    size: Source<Axes>,
    proportions: Source<Axes>,
    hide: Source<bool>,
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("transform", &self.transform.as_ref().map(|s| s.get()))
            .field("opacity", &self.opacity.as_ref().map(|s| s.get()))
            .field("origin", &self.origin.as_ref().map(|s| s.get()))
            .field("align", &self.align.as_ref().map(|s| s.get()))
            .field("size", &self.size.as_ref().map(|s| s.get()))
            .field("proportions", &self.proportions.as_ref().map(|s| s.get()))
            .field("hide", &self.hide.as_ref().map(|s| s.get()))
            .finish()
    }
}

fn boxed<T, S: ValueSource<T> + 'static>(source: S) -> Source<T> {
    Some(Box::new(source))
}

impl Modifier {
    /// Creates a modifier that passes its child through unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transform source.
    #[must_use]
    pub fn with_transform(mut self, source: impl ValueSource<Transform3d> + 'static) -> Self {
        self.set_transform(source);
        self
    }

    /// Sets the opacity source.
    #[must_use]
    pub fn with_opacity(mut self, source: impl ValueSource<f64> + 'static) -> Self {
        self.set_opacity(source);
        self
    }

    /// Sets the origin source.
    #[must_use]
    pub fn with_origin(mut self, source: impl ValueSource<Vec2> + 'static) -> Self {
        self.set_origin(source);
        self
    }

    /// Sets the align source.
    #[must_use]
    pub fn with_align(mut self, source: impl ValueSource<Vec2> + 'static) -> Self {
        self.set_align(source);
        self
    }

    /// Sets the size source.
    #[must_use]
    pub fn with_size(mut self, source: impl ValueSource<Axes> + 'static) -> Self {
        self.set_size(source);
        self
    }

    /// Sets the proportions source.
    #[must_use]
    pub fn with_proportions(mut self, source: impl ValueSource<Axes> + 'static) -> Self {
        self.set_proportions(source);
        self
    }

    /// Sets the hide source.
    #[must_use]
    pub fn with_hide(mut self, source: impl ValueSource<bool> + 'static) -> Self {
        self.set_hide(source);
        self
    }

    /// Replaces the transform source.
    pub fn set_transform(&mut self, source: impl ValueSource<Transform3d> + 'static) {
        self.transform = boxed(source);
    }

    /// Replaces the opacity source.
    pub fn set_opacity(&mut self, source: impl ValueSource<f64> + 'static) {
        self.opacity = boxed(source);
    }

    /// Replaces the origin source.
    pub fn set_origin(&mut self, source: impl ValueSource<Vec2> + 'static) {
        self.origin = boxed(source);
    }

    /// Replaces the align source.
    pub fn set_align(&mut self, source: impl ValueSource<Vec2> + 'static) {
        self.align = boxed(source);
    }

    /// Replaces the size source.
    pub fn set_size(&mut self, source: impl ValueSource<Axes> + 'static) {
        self.size = boxed(source);
    }

    /// Replaces the proportions source.
    pub fn set_proportions(&mut self, source: impl ValueSource<Axes> + 'static) {
        self.proportions = boxed(source);
    }

    /// Replaces the hide source.
    pub fn set_hide(&mut self, source: impl ValueSource<bool> + 'static) {
        self.hide = boxed(source);
    }

    /// Returns `true` if any source is mid-transition.
    #[must_use]
    pub fn is_active(&self) -> bool {
        fn active<T>(source: &Source<T>) -> bool {
            source.as_ref().is_some_and(|s| s.is_active())
        }
        active(&self.transform)
            || active(&self.opacity)
            || active(&self.origin)
            || active(&self.align)
            || active(&self.size)
            || active(&self.proportions)
            || active(&self.hide)
    }

    /// The current size override, for layouts that query it.
    #[must_use]
    pub fn size(&self) -> Option<Axes> {
        self.size.as_ref().map(|s| s.get())
    }
}

impl Modify for Modifier {
    fn modify(&self, target: RenderSpec) -> RenderSpec {
        SpecNode {
            target,
            transform: self.transform.as_ref().map(|s| s.get()),
            opacity: self.opacity.as_ref().map(|s| s.get()),
            origin: self.origin.as_ref().map(|s| s.get()),
            align: self.align.as_ref().map(|s| s.get()),
            size: self.size(),
            proportions: self.proportions.as_ref().map(|s| s.get()),
            hide: self.hide.as_ref().map(|s| s.get()),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use alloc::rc::Rc;
    use core::cell::Cell;

    struct Tween {
        value: f64,
        active: bool,
    }

    impl ValueSource<f64> for Tween {
        fn get(&self) -> f64 {
            self.value
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    fn target() -> RenderSpec {
        RenderSpec::Entity(EntityId {
            idx: 0,
            generation: 0,
        })
    }

    #[test]
    fn empty_modifier_wraps_without_overrides() {
        let spec = Modifier::new().modify(target());
        assert_eq!(spec, RenderSpec::from(SpecNode::new(target())));
    }

    #[test]
    fn constants_and_closures_feed_the_spec() {
        let angle = Rc::new(Cell::new(0.0));
        let source = angle.clone();
        let m = Modifier::new()
            .with_opacity(Constant(0.5))
            .with_transform(move || Transform3d::from_rotation_z(source.get()));

        angle.set(1.0);
        let RenderSpec::Wrapped(node) = m.modify(target()) else {
            panic!("modifier must wrap");
        };
        assert_eq!(node.opacity, Some(0.5));
        assert_eq!(node.transform, Some(Transform3d::from_rotation_z(1.0)));
        assert_eq!(node.origin, None);
    }

    #[test]
    fn activity_follows_sources() {
        let mut m = Modifier::new().with_opacity(Tween {
            value: 0.2,
            active: true,
        });
        assert!(m.is_active());
        m.set_opacity(Constant(1.0));
        assert!(!m.is_active());
    }
}
