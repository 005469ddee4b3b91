// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform with the mapping helpers occlusion needs.
//!
//! Layers live in 3-D space but occlusion is tracked on a 2-D pixel plane.
//! Points therefore enter with `z = 0` and leave with `z` dropped. Where a
//! transform has perspective, homogeneous coordinates are clipped against
//! `w > 0` before dividing so that geometry behind the eye never produces
//! wrapped-around rectangles.
//!
//! Element `(row r, column c)` is `cols[c][r]`.

use core::ops::Mul;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Rect};
use smallvec::SmallVec;

use crate::geometry::IntRect;

/// Pivots smaller than this make a matrix non-invertible.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Entries smaller than this count as zero in axis-alignment checks.
const AXIS_EPSILON: f64 = 1e-12;

/// Homogeneous points with `w` at or below this are behind the eye.
const W_EPSILON: f64 = 1e-7;

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix.
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

    /// Creates a transform from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
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

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Y axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a perspective transform with the eye at distance `depth`.
    ///
    /// Points at `z = depth` are projected to infinity.
    #[inline]
    #[must_use]
    pub fn from_perspective(depth: f64) -> Self {
        let mut t = Self::IDENTITY;
        if depth != 0.0 {
            t.cols[2][3] = -1.0 / depth;
        }
        t
    }

    /// Embeds a 2-D affine transform.
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self {
            cols: [
                [a, b, 0.0, 0.0],
                [c, d, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [e, f, 0.0, 1.0],
            ],
        }
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Returns `true` if the transform is exactly the identity.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Returns `true` if the bottom row is anything other than `[0, 0, 0, 1]`.
    #[inline]
    #[must_use]
    pub fn has_perspective(&self) -> bool {
        let c = &self.cols;
        c[0][3] != 0.0 || c[1][3] != 0.0 || c[2][3] != 0.0 || c[3][3] != 1.0
    }

    /// Returns `true` if the transform is a 2-D translation by whole pixels.
    #[must_use]
    pub fn is_integer_2d_translation(&self) -> bool {
        let c = &self.cols;
        let mut linear = *self;
        linear.cols[3][0] = 0.0;
        linear.cols[3][1] = 0.0;
        linear.is_identity() && c[3][0].floor() == c[3][0] && c[3][1].floor() == c[3][1]
    }

    /// Returns `true` if an axis-aligned rectangle stays axis-aligned.
    ///
    /// Only axis swaps and scales (including degenerate zero scales) keep
    /// rectangles aligned, so the upper-left 2×2 block may have at most one
    /// non-zero entry per row and per column. Any x or y perspective term
    /// disqualifies the transform.
    #[must_use]
    pub fn preserves_2d_axis_alignment(&self) -> bool {
        let c = &self.cols;
        if c[0][3].abs() > AXIS_EPSILON || c[1][3].abs() > AXIS_EPSILON {
            return false;
        }
        let nz = |v: f64| v.abs() > AXIS_EPSILON;
        let (m00, m01, m10, m11) = (nz(c[0][0]), nz(c[1][0]), nz(c[0][1]), nz(c[1][1]));
        !(m00 && m01) && !(m10 && m11) && !(m00 && m10) && !(m01 && m11)
    }

    /// Returns the inverse, or `None` if the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        // Gauss-Jordan with partial pivoting on a row-major copy.
        let mut a = [[0.0_f64; 4]; 4];
        let mut inv = [[0.0_f64; 4]; 4];
        for r in 0..4 {
            for c in 0..4 {
                a[r][c] = self.cols[c][r];
            }
            inv[r][r] = 1.0;
        }
        for col in 0..4 {
            let mut pivot = col;
            for r in col + 1..4 {
                if a[r][col].abs() > a[pivot][col].abs() {
                    pivot = r;
                }
            }
            let p = a[pivot][col];
            if !p.is_finite() || p.abs() < SINGULAR_EPSILON {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);
            for c in 0..4 {
                a[col][c] /= p;
                inv[col][c] /= p;
            }
            for r in 0..4 {
                if r == col {
                    continue;
                }
                let f = a[r][col];
                if f == 0.0 {
                    continue;
                }
                for c in 0..4 {
                    let (pa, pi) = (a[col][c], inv[col][c]);
                    a[r][c] -= f * pa;
                    inv[r][c] -= f * pi;
                }
            }
        }
        let mut out = Self::IDENTITY;
        for r in 0..4 {
            for c in 0..4 {
                out.cols[c][r] = inv[r][c];
            }
        }
        out.is_finite().then_some(out)
    }

    /// Returns `true` if [`inverse`](Self::inverse) would succeed.
    #[inline]
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        self.inverse().is_some()
    }

    /// Maps `(x, y, z, 1)` to homogeneous `[x, y, z, w]`.
    #[inline]
    fn map_homogeneous(&self, x: f64, y: f64, z: f64) -> [f64; 4] {
        let c = &self.cols;
        let mut out = [0.0; 4];
        for (i, v) in out.iter_mut().enumerate() {
            *v = c[0][i] * x + c[1][i] * y + c[2][i] * z + c[3][i];
        }
        out
    }

    /// Maps a point on the `z = 0` plane, dropping the resulting `z`.
    ///
    /// Returns `None` when the point lands behind the eye.
    #[must_use]
    pub fn map_point(&self, p: Point) -> Option<Point> {
        let [x, y, _, w] = self.map_homogeneous(p.x, p.y, 0.0);
        (w > W_EPSILON).then(|| Point::new(x / w, y / w))
    }

    /// Projects a destination point back through the transform.
    ///
    /// Casts a ray along z through `p` and finds where it hits the `z = 0`
    /// plane of the transformed space. Returns `None` when the ray is parallel
    /// to that plane or the hit lies behind the eye.
    #[must_use]
    pub fn project_point(&self, p: Point) -> Option<Point> {
        let c = &self.cols;
        let m22 = c[2][2];
        if m22.abs() < SINGULAR_EPSILON {
            return None;
        }
        let z = -(c[0][2] * p.x + c[1][2] * p.y + c[3][2]) / m22;
        let [x, y, _, w] = self.map_homogeneous(p.x, p.y, z);
        (w > W_EPSILON && w.is_finite()).then(|| Point::new(x / w, y / w))
    }

    /// Maps a rectangle and returns the bounds of the visible part.
    ///
    /// Under perspective, the quad is clipped against `w > 0` first. A quad
    /// entirely behind the eye maps to [`Rect::ZERO`].
    #[must_use]
    pub fn map_clipped_rect(&self, rect: Rect) -> Rect {
        let corners = [
            (rect.x0, rect.y0),
            (rect.x1, rect.y0),
            (rect.x1, rect.y1),
            (rect.x0, rect.y1),
        ];
        let mapped = corners.map(|(x, y)| self.map_homogeneous(x, y, 0.0));

        let mut clipped: SmallVec<[[f64; 4]; 8]> = SmallVec::new();
        for (i, &a) in mapped.iter().enumerate() {
            let b = mapped[(i + 1) % mapped.len()];
            let a_in = a[3] > W_EPSILON;
            let b_in = b[3] > W_EPSILON;
            if a_in {
                clipped.push(a);
            }
            if a_in != b_in {
                let t = (W_EPSILON - a[3]) / (b[3] - a[3]);
                let mut p = [0.0; 4];
                for k in 0..4 {
                    p[k] = a[k] + (b[k] - a[k]) * t;
                }
                // Nudge onto the visible side so the divide below stays finite.
                p[3] = p[3].max(W_EPSILON);
                clipped.push(p);
            }
        }

        let mut points = clipped.iter().map(|p| Point::new(p[0] / p[3], p[1] / p[3]));
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p))
    }

    /// Maps a pixel rectangle and returns the enclosing pixel rectangle.
    #[must_use]
    pub fn map_enclosing_clipped_rect(&self, rect: IntRect) -> IntRect {
        if let Some((dx, dy)) = self.integer_translation() {
            return rect.offset(dx, dy);
        }
        IntRect::enclosing(self.map_clipped_rect(rect.to_kurbo()))
    }

    /// Maps a pixel rectangle and returns the largest pixel rectangle inside
    /// the result.
    ///
    /// The transform must [preserve axis alignment](Self::preserves_2d_axis_alignment);
    /// otherwise the result is empty.
    #[must_use]
    pub fn map_enclosed_rect_with_2d_axis_aligned_transform(&self, rect: IntRect) -> IntRect {
        if let Some((dx, dy)) = self.integer_translation() {
            return rect.offset(dx, dy);
        }
        if !self.preserves_2d_axis_alignment() || rect.is_empty() {
            return IntRect::ZERO;
        }
        let r = rect.to_kurbo();
        let (Some(a), Some(b)) = (
            self.map_point(Point::new(r.x0, r.y0)),
            self.map_point(Point::new(r.x1, r.y1)),
        ) else {
            return IntRect::ZERO;
        };
        IntRect::enclosed(Rect::from_points(a, b))
    }

    /// Projects a pixel rectangle back through the transform.
    ///
    /// Returns `None` if any corner cannot be projected.
    #[must_use]
    pub fn project_enclosing_clipped_rect(&self, rect: IntRect) -> Option<IntRect> {
        if let Some((dx, dy)) = self.integer_translation() {
            return Some(rect.offset(dx, dy));
        }
        let r = rect.to_kurbo();
        let corners = [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ];
        let mut bounds: Option<Rect> = None;
        for corner in corners {
            let p = self.project_point(corner)?;
            bounds = Some(bounds.map_or(Rect::from_points(p, p), |b| b.union_pt(p)));
        }
        bounds.map(IntRect::enclosing)
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "only taken when the translation is integral and in range"
    )]
    fn integer_translation(&self) -> Option<(i32, i32)> {
        if !self.is_integer_2d_translation() {
            return None;
        }
        let (dx, dy) = (self.cols[3][0], self.cols[3][1]);
        let range = f64::from(i32::MIN)..=f64::from(i32::MAX);
        (range.contains(&dx) && range.contains(&dy)).then(|| (dx as i32, dy as i32))
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for Transform3d {
    fn from(affine: Affine) -> Self {
        Self::from_affine(affine)
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

    fn approx(a: Transform3d, b: Transform3d) -> bool {
        a.cols
            .iter()
            .flatten()
            .zip(b.cols.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn scale_then_translate() {
        let s = Transform3d::from_scale(2.0, 2.0, 2.0);
        let t = Transform3d::from_translation(3.0, 4.0, 0.0);
        let p = (t * s).map_point(Point::new(1.0, 1.0));
        assert_eq!(p, Some(Point::new(5.0, 6.0)));
    }

    #[test]
    fn inverse_round_trips() {
        let t = Transform3d::from_translation(10.0, -4.0, 2.0)
            * Transform3d::from_rotation_z(0.3)
            * Transform3d::from_scale(2.0, 0.5, 1.0);
        let inv = t.inverse().expect("invertible");
        assert!(approx(t * inv, Transform3d::IDENTITY));
        assert!(approx(inv * t, Transform3d::IDENTITY));
    }

    #[test]
    fn singular_has_no_inverse() {
        assert!(Transform3d::from_scale(0.0, 1.0, 1.0).inverse().is_none());
        assert!(!Transform3d::from_scale(1.0, 0.0, 1.0).is_invertible());
    }

    #[test]
    fn axis_alignment() {
        assert!(Transform3d::IDENTITY.preserves_2d_axis_alignment());
        assert!(Transform3d::from_scale(2.0, -3.0, 1.0).preserves_2d_axis_alignment());
        assert!(
            Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2).preserves_2d_axis_alignment()
        );
        assert!(!Transform3d::from_rotation_z(0.2).preserves_2d_axis_alignment());
        // Without perspective, a y rotation only squashes x.
        assert!(Transform3d::from_rotation_y(0.2).preserves_2d_axis_alignment());
        assert!(
            !(Transform3d::from_perspective(100.0) * Transform3d::from_rotation_y(0.2))
                .preserves_2d_axis_alignment()
        );
        let mut persp = Transform3d::IDENTITY;
        persp.cols[0][3] = 0.01;
        assert!(!persp.preserves_2d_axis_alignment());
    }

    #[test]
    fn integer_translation_fast_path() {
        let t = Transform3d::from_translation(100.0, 5.0, 0.0);
        assert!(t.is_integer_2d_translation());
        assert_eq!(
            t.map_enclosing_clipped_rect(IntRect::new(0, 0, 10, 10)),
            IntRect::new(100, 5, 10, 10)
        );
        assert!(!Transform3d::from_translation(0.5, 0.0, 0.0).is_integer_2d_translation());
    }

    #[test]
    fn enclosing_and_enclosed_differ_on_fractional_scale() {
        let t = Transform3d::from_scale(1.5, 1.5, 1.0);
        let r = IntRect::new(1, 1, 3, 3);
        // Maps to (1.5, 1.5)–(6, 6).
        assert_eq!(t.map_enclosing_clipped_rect(r), IntRect::from_edges(1, 1, 6, 6));
        assert_eq!(
            t.map_enclosed_rect_with_2d_axis_aligned_transform(r),
            IntRect::from_edges(2, 2, 6, 6)
        );
    }

    #[test]
    fn rotated_rect_bounds() {
        let t = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_4);
        let mapped = t.map_clipped_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let half_diag = 10.0 * core::f64::consts::FRAC_1_SQRT_2;
        assert!((mapped.x0 + half_diag).abs() < 1e-9);
        assert!((mapped.x1 - half_diag).abs() < 1e-9);
        assert!(mapped.y0.abs() < 1e-9);
        assert!((mapped.y1 - 2.0 * half_diag).abs() < 1e-9);
    }

    #[test]
    fn perspective_clips_geometry_behind_the_eye() {
        // Eye at z = 10, rect tilted so its far half passes behind it.
        let t = Transform3d::from_perspective(10.0) * Transform3d::from_rotation_y(1.2);
        let mapped = t.map_clipped_rect(Rect::new(-100.0, -10.0, 100.0, 10.0));
        assert!(mapped.x0.is_finite() && mapped.x1.is_finite());
        assert!(mapped.width() > 0.0);
    }

    #[test]
    fn fully_behind_the_eye_maps_to_zero() {
        let mut t = Transform3d::IDENTITY;
        t.cols[3][3] = -1.0;
        assert_eq!(t.map_clipped_rect(Rect::new(0.0, 0.0, 10.0, 10.0)), Rect::ZERO);
        assert_eq!(t.map_point(Point::new(1.0, 1.0)), None);
    }

    #[test]
    fn project_inverts_map_for_flat_transforms() {
        let t =
            Transform3d::from_translation(5.5, 2.0, 0.0) * Transform3d::from_scale(2.0, 2.0, 1.0);
        let inv = t.inverse().expect("invertible");
        let r = IntRect::new(11, 4, 20, 20);
        let back = inv.project_enclosing_clipped_rect(t.map_enclosing_clipped_rect(r));
        let back = back.expect("projectable");
        assert!(back.contains(r), "{back:?} should contain {r:?}");
    }

    #[test]
    fn from_affine_matches_kurbo() {
        let a = Affine::translate((3.0, 4.0)) * Affine::scale(2.0);
        let t = Transform3d::from(a);
        let p = Point::new(1.0, 2.0);
        assert_eq!(t.map_point(p), Some(a * p));
    }
}
