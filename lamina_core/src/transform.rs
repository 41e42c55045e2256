// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform with the helpers spec interpretation needs.
//!
//! Besides composition, the interpreter moves frames around in the
//! coordinate space of an ancestor ([`Transform3d::vec_in_context`]), pushes
//! translations before or after a transform ([`Transform3d::move_then`],
//! [`Transform3d::then_move`]), and replaces hidden subtrees with a
//! near-zero scale ([`Transform3d::collapsed`]). Output writes serialize to
//! the CSS `matrix3d()` form.

use alloc::string::String;
use core::fmt::Write as _;
use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Scale factor used for collapsed (hidden) transforms.
///
/// Not exactly zero: some compositors drop or mis-rasterize elements with a
/// singular transform, and a tiny scale stays invertible.
pub const HIDDEN_SCALE: f64 = 1e-4;

/// Components closer to zero than this are written as `0` in CSS.
const CSS_EPSILON: f64 = 1e-6;

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, the same element order as
/// CSS `matrix3d()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the X axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_x(radians: f64) -> Self {
        let (s, c) = sin_cos(radians);
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Y axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let (s, c) = sin_cos(radians);
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = sin_cos(radians);
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a 2-D skew: `x` shears along the X axis, `y` along Y (radians).
    #[must_use]
    pub fn from_skew(x: f64, y: f64) -> Self {
        Self {
            cols: [
                [1.0, tan(y), 0.0, 0.0],
                [tan(x), 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// A transform that scales everything to (nearly) nothing.
    ///
    /// Hidden entities keep their element but commit this transform.
    #[inline]
    #[must_use]
    pub const fn collapsed() -> Self {
        Self::from_scale(HIDDEN_SCALE, HIDDEN_SCALE, HIDDEN_SCALE)
    }

    /// Returns `true` if the linear part is no larger than a
    /// [collapsed](Self::collapsed) transform along every axis.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        let c = &self.cols;
        c[0][0].abs() <= HIDDEN_SCALE && c[1][1].abs() <= HIDDEN_SCALE && c[2][2].abs() <= HIDDEN_SCALE
    }

    /// Returns the translation column as `[x, y, z]`.
    #[inline]
    #[must_use]
    pub const fn translation(&self) -> [f64; 3] {
        let t = self.cols[3];
        [t[0], t[1], t[2]]
    }

    /// Returns this transform followed by a translation by `v`.
    ///
    /// `v` is expressed in the output (parent) space.
    #[inline]
    #[must_use]
    pub const fn then_move(mut self, v: [f64; 3]) -> Self {
        self.cols[3][0] += v[0];
        self.cols[3][1] += v[1];
        self.cols[3][2] += v[2];
        self
    }

    /// Returns a translation by `v` followed by this transform.
    ///
    /// `v` is expressed in the local space, so it passes through the linear
    /// part before landing in the translation column.
    #[inline]
    #[must_use]
    pub fn move_then(self, v: [f64; 3]) -> Self {
        let moved = self.vec_in_context(v);
        self.then_move(moved)
    }

    /// Maps the vector `v` through the linear (non-translating) part.
    #[must_use]
    pub fn vec_in_context(&self, v: [f64; 3]) -> [f64; 3] {
        let c = &self.cols;
        [
            c[0][0] * v[0] + c[1][0] * v[1] + c[2][0] * v[2],
            c[0][1] * v[0] + c[1][1] * v[1] + c[2][1] * v[2],
            c[0][2] * v[0] + c[1][2] * v[1] + c[2][2] * v[2],
        ]
    }

    /// Returns this transform applied about `origin` instead of about zero.
    #[must_use]
    pub fn about_origin(self, origin: [f64; 3]) -> Self {
        Self::from_translation(origin[0], origin[1], origin[2])
            * self
            * Self::from_translation(-origin[0], -origin[1], -origin[2])
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Is any component of this transform [NaN]?
    ///
    /// [NaN]: f64::is_nan
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.cols.iter().flatten().any(|v| v.is_nan())
    }

    /// Serializes as a CSS `matrix3d(...)` value.
    ///
    /// Components within `1e-6` of zero are written as `0` so that
    /// float noise does not defeat string-level change detection.
    #[must_use]
    pub fn to_css_matrix3d(&self) -> String {
        let mut out = String::with_capacity(128);
        out.push_str("matrix3d(");
        for (i, v) in self.cols.iter().flatten().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if v.abs() < CSS_EPSILON {
                out.push('0');
            } else {
                // Writing into a String cannot fail.
                let _ = write!(out, "{v}");
            }
        }
        out.push(')');
        out
    }
}

#[cfg(feature = "std")]
#[inline]
fn sin_cos(radians: f64) -> (f64, f64) {
    radians.sin_cos()
}

#[cfg(not(feature = "std"))]
#[inline]
fn sin_cos(radians: f64) -> (f64, f64) {
    (radians.sin(), radians.cos())
}

#[inline]
fn tan(radians: f64) -> f64 {
    let (s, c) = sin_cos(radians);
    s / c
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < EPS)
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
    }

    #[test]
    fn then_move_adds_in_parent_space() {
        let r = Transform3d::from_rotation_z(FRAC_PI_2);
        let moved = r.then_move([10.0, 0.0, 0.0]);
        assert!(close(moved.translation(), [10.0, 0.0, 0.0]), "{moved:?}");
    }

    #[test]
    fn move_then_goes_through_linear_part() {
        let r = Transform3d::from_rotation_z(FRAC_PI_2);
        let moved = r.move_then([10.0, 0.0, 0.0]);
        // +90° about Z maps +X onto +Y.
        assert!(close(moved.translation(), [0.0, 10.0, 0.0]), "{moved:?}");
        assert_eq!(moved, r * Transform3d::from_translation(10.0, 0.0, 0.0));
    }

    #[test]
    fn vec_in_context_ignores_translation() {
        let t = Transform3d::from_translation(5.0, 5.0, 5.0) * Transform3d::from_scale(2.0, 3.0, 1.0);
        assert!(close(t.vec_in_context([1.0, 1.0, 0.0]), [2.0, 3.0, 0.0]));
    }

    #[test]
    fn about_origin_keeps_origin_fixed() {
        let r = Transform3d::from_rotation_z(FRAC_PI_2).about_origin([50.0, 50.0, 0.0]);
        // The pivot itself does not move.
        let p = r.vec_in_context([50.0, 50.0, 0.0]);
        let t = r.translation();
        assert!(close([p[0] + t[0], p[1] + t[1], p[2] + t[2]], [50.0, 50.0, 0.0]));
    }

    #[test]
    fn rotations_are_orthonormal() {
        for r in [
            Transform3d::from_rotation_x(0.3),
            Transform3d::from_rotation_y(0.7),
            Transform3d::from_rotation_z(1.1),
        ] {
            for col in &r.cols[..3] {
                let len = col[0] * col[0] + col[1] * col[1] + col[2] * col[2];
                assert!((len - 1.0).abs() < EPS, "{r:?}");
            }
        }
    }

    #[test]
    fn skew_shears_the_other_axis() {
        let s = Transform3d::from_skew(core::f64::consts::FRAC_PI_4, 0.0);
        assert!(close(s.vec_in_context([0.0, 1.0, 0.0]), [1.0, 1.0, 0.0]));
    }

    #[test]
    fn collapsed_is_detected() {
        assert!(Transform3d::collapsed().is_collapsed());
        assert!(!Transform3d::IDENTITY.is_collapsed());
        assert!(!Transform3d::from_scale(0.5, 0.5, 0.5).is_collapsed());
    }

    #[test]
    fn css_matrix3d_snaps_noise() {
        let t = Transform3d::from_translation(10.0, -2.5, 0.0);
        assert_eq!(
            t.to_css_matrix3d(),
            "matrix3d(1,0,0,0,0,1,0,0,0,0,1,0,10,-2.5,0,1)"
        );
        let r = Transform3d::from_rotation_z(FRAC_PI_2);
        assert_eq!(
            r.to_css_matrix3d(),
            "matrix3d(0,1,0,0,-1,0,0,0,0,0,1,0,0,0,0,1)"
        );
    }

    #[test]
    fn nan_is_not_finite() {
        let mut t = Transform3d::IDENTITY;
        assert!(t.is_finite());
        assert!(!t.is_nan());
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(t.is_nan());
    }
}
