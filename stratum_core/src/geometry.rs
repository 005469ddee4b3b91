// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer pixel geometry.
//!
//! Occlusion and clipping decisions are made on whole pixels so that the
//! answers are stable under repeated transformation. [`IntRect`] is the
//! workhorse; conversions to and from [`kurbo::Rect`] pick the rounding
//! direction explicitly ([`IntRect::enclosing`] grows, [`IntRect::enclosed`]
//! shrinks).

use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Rect;
use smallvec::SmallVec;

/// A width/height pair in whole pixels.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntSize {
    /// Horizontal extent.
    pub width: i32,
    /// Vertical extent.
    pub height: i32,
}

impl IntSize {
    /// The empty size.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a size, clamping negative extents to zero.
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Returns `true` if either extent is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl fmt::Debug for IntSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle in whole pixels.
///
/// Stored as origin plus size. Negative sizes are clamped to zero on
/// construction, so an `IntRect` is never inverted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width (never negative).
    pub width: i32,
    /// Height (never negative).
    pub height: i32,
}

impl IntRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from its origin and size.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Creates a rectangle at the origin with the given size.
    #[inline]
    #[must_use]
    pub const fn from_size(size: IntSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Creates a rectangle from its four edges.
    #[inline]
    #[must_use]
    pub const fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Returns the size of the rectangle.
    #[inline]
    #[must_use]
    pub const fn size(self) -> IntSize {
        IntSize::new(self.width, self.height)
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    ///
    /// An empty `other` is contained when its origin lies within the edges of
    /// `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns `true` if the pixel at `(x, y)` is inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains_point(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Returns `true` if the two rectangles share at least one pixel.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Returns the overlap of the two rectangles, or [`IntRect::ZERO`].
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return Self::ZERO;
        }
        Self::from_edges(left, top, right, bottom)
    }

    /// Returns the smallest rectangle containing both inputs.
    ///
    /// Empty inputs are ignored.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Removes `other` from `self` when the remainder is still a rectangle.
    ///
    /// If `other` only covers a corner or punches a hole, `self` is returned
    /// unchanged, so the result always contains the exact difference.
    #[must_use]
    pub fn subtract(self, other: Self) -> Self {
        if !self.intersects(other) {
            return self;
        }
        if other.contains(self) {
            return Self::ZERO;
        }
        let mut left = self.x;
        let mut top = self.y;
        let mut right = self.right();
        let mut bottom = self.bottom();

        if other.y <= self.y && other.bottom() >= self.bottom() {
            // Full-height overlap: trim horizontally.
            if other.x <= self.x {
                left = other.right();
            } else if other.right() >= self.right() {
                right = other.x;
            }
        } else if other.x <= self.x && other.right() >= self.right() {
            // Full-width overlap: trim vertically.
            if other.y <= self.y {
                top = other.bottom();
            } else if other.bottom() >= self.bottom() {
                bottom = other.y;
            }
        }
        Self::from_edges(left, top, right, bottom)
    }

    /// Moves each edge inward by the given amounts (negative values grow).
    #[must_use]
    pub const fn inset(self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            self.x.saturating_add(left),
            self.y.saturating_add(top),
            self.width.saturating_sub(left).saturating_sub(right),
            self.height.saturating_sub(top).saturating_sub(bottom),
        )
    }

    /// Translates the rectangle.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Splits `self` into the pieces not covered by `hole`.
    ///
    /// Pieces are full-width bands above and below the hole plus the
    /// left/right remainders beside it, so at most four rectangles come back.
    /// They do not overlap each other or `hole`.
    #[must_use]
    pub fn split_around(self, hole: Self) -> SmallVec<[Self; 4]> {
        let mut pieces = SmallVec::new();
        if !self.intersects(hole) {
            if !self.is_empty() {
                pieces.push(self);
            }
            return pieces;
        }
        if hole.y > self.y {
            pieces.push(Self::from_edges(self.x, self.y, self.right(), hole.y));
        }
        if hole.bottom() < self.bottom() {
            pieces.push(Self::from_edges(
                self.x,
                hole.bottom(),
                self.right(),
                self.bottom(),
            ));
        }
        let band_top = self.y.max(hole.y);
        let band_bottom = self.bottom().min(hole.bottom());
        if hole.x > self.x {
            pieces.push(Self::from_edges(self.x, band_top, hole.x, band_bottom));
        }
        if hole.right() < self.right() {
            pieces.push(Self::from_edges(
                hole.right(),
                band_top,
                self.right(),
                band_bottom,
            ));
        }
        pieces
    }

    /// Smallest pixel rectangle containing `rect`.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "float-to-int casts saturate, which is the clamping we want"
    )]
    #[must_use]
    pub fn enclosing(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::from_edges(
            rect.x0.floor() as i32,
            rect.y0.floor() as i32,
            rect.x1.ceil() as i32,
            rect.y1.ceil() as i32,
        )
    }

    /// Largest pixel rectangle contained in `rect`.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "float-to-int casts saturate, which is the clamping we want"
    )]
    #[must_use]
    pub fn enclosed(rect: Rect) -> Self {
        let rect = rect.abs();
        let left = rect.x0.ceil() as i32;
        let top = rect.y0.ceil() as i32;
        let right = rect.x1.floor() as i32;
        let bottom = rect.y1.floor() as i32;
        if right <= left || bottom <= top {
            return Self::ZERO;
        }
        Self::from_edges(left, top, right, bottom)
    }

    /// Converts to a floating-point rectangle.
    #[inline]
    #[must_use]
    pub fn to_kurbo(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }
}

impl fmt::Debug for IntRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IntRect({},{} {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

impl From<IntSize> for IntRect {
    fn from(size: IntSize) -> Self {
        Self::from_size(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_size_is_clamped() {
        let r = IntRect::new(5, 5, -3, 4);
        assert_eq!(r.width, 0);
        assert!(r.is_empty());
    }

    #[test]
    fn intersect_overlapping() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(5, 5, 10, 10);
        assert_eq!(a.intersect(b), IntRect::new(5, 5, 5, 5));
        assert!(a.intersects(b));
    }

    #[test]
    fn intersect_touching_edges_is_empty() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(10, 0, 10, 10);
        assert!(a.intersect(b).is_empty());
        assert!(!a.intersects(b));
    }

    #[test]
    fn union_ignores_empty() {
        let a = IntRect::new(3, 4, 5, 6);
        assert_eq!(a.union(IntRect::ZERO), a);
        assert_eq!(IntRect::ZERO.union(a), a);
        let b = IntRect::new(10, 10, 2, 2);
        assert_eq!(a.union(b), IntRect::from_edges(3, 4, 12, 12));
    }

    #[test]
    fn subtract_trims_full_overlap_side() {
        let a = IntRect::new(0, 0, 100, 100);
        assert_eq!(
            a.subtract(IntRect::new(-10, -10, 50, 200)),
            IntRect::new(40, 0, 60, 100)
        );
        assert_eq!(
            a.subtract(IntRect::new(0, 70, 100, 50)),
            IntRect::new(0, 0, 100, 70)
        );
    }

    #[test]
    fn subtract_corner_keeps_original() {
        let a = IntRect::new(0, 0, 100, 100);
        assert_eq!(a.subtract(IntRect::new(50, 50, 100, 100)), a);
        assert_eq!(a.subtract(IntRect::new(-5, -5, 200, 200)), IntRect::ZERO);
    }

    #[test]
    fn split_around_center_hole() {
        let a = IntRect::new(0, 0, 30, 30);
        let pieces = a.split_around(IntRect::new(10, 10, 10, 10));
        assert_eq!(pieces.len(), 4);
        let area: u64 = pieces.iter().map(|r| r.area()).sum();
        assert_eq!(area, 900 - 100);
        for (i, p) in pieces.iter().enumerate() {
            for q in &pieces[i + 1..] {
                assert!(!p.intersects(*q), "{p:?} overlaps {q:?}");
            }
        }
    }

    #[test]
    fn split_around_disjoint_returns_self() {
        let a = IntRect::new(0, 0, 10, 10);
        let pieces = a.split_around(IntRect::new(20, 20, 5, 5));
        assert_eq!(pieces.as_slice(), &[a]);
    }

    #[test]
    fn enclosing_and_enclosed_round_outward_and_inward() {
        let r = Rect::new(0.5, 0.25, 10.5, 9.75);
        assert_eq!(IntRect::enclosing(r), IntRect::from_edges(0, 0, 11, 10));
        assert_eq!(IntRect::enclosed(r), IntRect::from_edges(1, 1, 10, 9));
        assert!(IntRect::enclosed(Rect::new(0.2, 0.2, 0.8, 0.8)).is_empty());
    }

    #[test]
    fn inset_with_negative_values_grows() {
        let r = IntRect::new(10, 10, 10, 10);
        assert_eq!(r.inset(-2, -3, -4, -5), IntRect::new(8, 7, 16, 18));
        assert!(r.inset(6, 0, 6, 0).is_empty());
    }
}
