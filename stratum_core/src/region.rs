// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle-set regions.
//!
//! Two flavors with different contracts:
//!
//! - [`SimpleEnclosedRegion`] holds at most [`MAX_RECTS`] rectangles and is
//!   always a *subset* of the exact union of everything added to it. When an
//!   operation would exceed the cap, small pieces are dropped. Occlusion can
//!   afford to lose area (it only costs overdraw) but can never claim area
//!   that is not actually covered.
//! - [`Region`] is exact and unbounded. It backs final answers such as the
//!   visible area of the screen.
//!
//! Both keep their rectangles pairwise disjoint, so areas add up.

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::geometry::IntRect;

/// Upper bound on the rectangles a [`SimpleEnclosedRegion`] keeps.
pub const MAX_RECTS: usize = 8;

/// Returns `true` if the union of `rects` covers `rect`.
fn covers(rects: &[IntRect], rect: IntRect) -> bool {
    if rect.is_empty() {
        return true;
    }
    let mut remaining: SmallVec<[IntRect; 16]> = SmallVec::new();
    remaining.push(rect);
    for &r in rects {
        if !remaining.iter().any(|p| p.intersects(r)) {
            continue;
        }
        remaining = remaining.into_iter().flat_map(|p| p.split_around(r)).collect();
        if remaining.is_empty() {
            return true;
        }
    }
    remaining.is_empty()
}

/// Returns the union of `a` and `b` if that union is itself a rectangle.
fn exact_union(a: IntRect, b: IntRect) -> Option<IntRect> {
    if a.contains(b) {
        return Some(a);
    }
    if b.contains(a) {
        return Some(b);
    }
    let stacked = a.x == b.x && a.width == b.width && a.y <= b.bottom() && b.y <= a.bottom();
    let side_by_side = a.y == b.y && a.height == b.height && a.x <= b.right() && b.x <= a.right();
    (stacked || side_by_side).then(|| a.union(b))
}

/// A bounded, conservative region for accumulated occlusion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimpleEnclosedRegion {
    rects: SmallVec<[IntRect; MAX_RECTS]>,
}

impl SimpleEnclosedRegion {
    /// Creates an empty region.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the region covers nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Removes all rectangles.
    #[inline]
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Number of rectangles currently stored.
    #[inline]
    #[must_use]
    pub fn region_complexity(&self) -> usize {
        self.rects.len()
    }

    /// Returns rectangle `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.region_complexity()`.
    #[inline]
    #[must_use]
    pub fn rect(&self, i: usize) -> IntRect {
        self.rects[i]
    }

    /// Iterates the stored rectangles.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &IntRect> + '_ {
        self.rects.iter()
    }

    /// Bounding box of the region.
    #[must_use]
    pub fn bounds(&self) -> IntRect {
        self.rects.iter().fold(IntRect::ZERO, |acc, r| acc.union(*r))
    }

    /// Total covered area.
    #[must_use]
    pub fn area(&self) -> u64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Returns `true` if every pixel of `rect` is in the region.
    #[must_use]
    pub fn contains(&self, rect: IntRect) -> bool {
        covers(&self.rects, rect)
    }

    /// Returns `true` if the region contains the pixel at `(x, y)`.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains_point(x, y))
    }

    /// Returns `true` if the region shares a pixel with `rect`.
    #[must_use]
    pub fn intersects(&self, rect: IntRect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    /// Adds `rect` to the region.
    ///
    /// Neighbors that merge with `rect` into a single rectangle are absorbed.
    /// Otherwise only the parts of `rect` not already covered are added. If
    /// that pushes the region past [`MAX_RECTS`], the smallest rectangles are
    /// dropped.
    pub fn union(&mut self, rect: IntRect) {
        if rect.is_empty() || self.contains(rect) {
            return;
        }
        let mut merged = rect;
        loop {
            self.rects.retain(|r| !merged.contains(*r));
            let found = self
                .rects
                .iter()
                .enumerate()
                .find_map(|(i, r)| exact_union(*r, merged).map(|u| (i, u)));
            let Some((i, u)) = found else {
                break;
            };
            self.rects.remove(i);
            merged = u;
        }

        let mut pieces: SmallVec<[IntRect; 16]> = SmallVec::new();
        pieces.push(merged);
        for &r in &self.rects {
            if pieces.iter().any(|p| p.intersects(r)) {
                pieces = pieces.into_iter().flat_map(|p| p.split_around(r)).collect();
            }
        }
        self.rects.extend(pieces);
        self.enforce_limit();
    }

    /// Adds every rectangle of `other`.
    pub fn union_region(&mut self, other: &Self) {
        for &r in &other.rects {
            self.union(r);
        }
    }

    /// Removes `rect` from the region.
    pub fn subtract(&mut self, rect: IntRect) {
        if rect.is_empty() || !self.intersects(rect) {
            return;
        }
        let mut out: SmallVec<[IntRect; MAX_RECTS]> = SmallVec::new();
        for &r in &self.rects {
            out.extend(r.split_around(rect));
        }
        self.rects = out;
        self.enforce_limit();
    }

    /// Restricts the region to `rect`.
    pub fn intersect(&mut self, rect: IntRect) {
        self.rects = self
            .rects
            .iter()
            .map(|r| r.intersect(rect))
            .filter(|r| !r.is_empty())
            .collect();
    }

    fn enforce_limit(&mut self) {
        while self.rects.len() > MAX_RECTS {
            let smallest = self
                .rects
                .iter()
                .enumerate()
                .min_by_key(|(_, r)| r.area())
                .map(|(i, _)| i);
            if let Some(i) = smallest {
                self.rects.remove(i);
            }
        }
    }
}

impl From<IntRect> for SimpleEnclosedRegion {
    fn from(rect: IntRect) -> Self {
        let mut region = Self::new();
        region.union(rect);
        region
    }
}

/// An exact set of pixels, stored as disjoint rectangles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    rects: Vec<IntRect>,
}

impl Region {
    /// Creates an empty region.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the region covers nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The disjoint rectangles making up the region.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[IntRect] {
        &self.rects
    }

    /// Iterates the stored rectangles.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &IntRect> + '_ {
        self.rects.iter()
    }

    /// Bounding box of the region.
    #[must_use]
    pub fn bounds(&self) -> IntRect {
        self.rects.iter().fold(IntRect::ZERO, |acc, r| acc.union(*r))
    }

    /// Total covered area.
    #[must_use]
    pub fn area(&self) -> u64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Returns `true` if every pixel of `rect` is in the region.
    #[must_use]
    pub fn contains(&self, rect: IntRect) -> bool {
        covers(&self.rects, rect)
    }

    /// Returns `true` if the region contains the pixel at `(x, y)`.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains_point(x, y))
    }

    /// Adds `rect` to the region.
    pub fn union(&mut self, rect: IntRect) {
        if rect.is_empty() {
            return;
        }
        let mut pieces: Vec<IntRect> = alloc::vec![rect];
        for &r in &self.rects {
            if pieces.iter().any(|p| p.intersects(r)) {
                pieces = pieces.into_iter().flat_map(|p| p.split_around(r)).collect();
            }
        }
        self.rects.extend(pieces);
    }

    /// Removes `rect` from the region.
    pub fn subtract(&mut self, rect: IntRect) {
        if rect.is_empty() {
            return;
        }
        self.rects = self
            .rects
            .iter()
            .flat_map(|r| r.split_around(rect))
            .collect();
    }

    /// Restricts the region to `rect`.
    pub fn intersect(&mut self, rect: IntRect) {
        self.rects = self
            .rects
            .iter()
            .map(|r| r.intersect(rect))
            .filter(|r| !r.is_empty())
            .collect();
    }
}

impl From<IntRect> for Region {
    fn from(rect: IntRect) -> Self {
        let mut region = Self::new();
        region.union(rect);
        region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(rects: &[IntRect]) {
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(*b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn union_of_disjoint_rects_keeps_both() {
        let mut r = SimpleEnclosedRegion::new();
        r.union(IntRect::new(0, 0, 10, 10));
        r.union(IntRect::new(20, 0, 10, 10));
        assert_eq!(r.region_complexity(), 2);
        assert_eq!(r.area(), 200);
    }

    #[test]
    fn union_merges_adjacent_rects() {
        let mut r = SimpleEnclosedRegion::new();
        r.union(IntRect::new(0, 0, 10, 10));
        r.union(IntRect::new(10, 0, 10, 10));
        assert_eq!(r.region_complexity(), 1);
        assert_eq!(r.rect(0), IntRect::new(0, 0, 20, 10));
    }

    #[test]
    fn union_of_contained_rect_is_noop() {
        let mut r = SimpleEnclosedRegion::from(IntRect::new(0, 0, 100, 100));
        r.union(IntRect::new(10, 10, 10, 10));
        assert_eq!(r.region_complexity(), 1);
        assert_eq!(r.bounds(), IntRect::new(0, 0, 100, 100));
    }

    #[test]
    fn union_with_covering_rect_replaces_contents() {
        let mut r = SimpleEnclosedRegion::new();
        r.union(IntRect::new(10, 10, 10, 10));
        r.union(IntRect::new(40, 40, 10, 10));
        r.union(IntRect::new(0, 0, 100, 100));
        assert_eq!(r.region_complexity(), 1);
        assert_eq!(r.area(), 10_000);
    }

    #[test]
    fn partially_overlapping_union_stays_disjoint() {
        let mut r = SimpleEnclosedRegion::new();
        r.union(IntRect::new(0, 0, 20, 20));
        r.union(IntRect::new(10, 10, 20, 20));
        assert_disjoint(&r.iter().copied().collect::<Vec<_>>());
        assert_eq!(r.area(), 400 + 400 - 100);
        assert!(r.contains(IntRect::new(0, 0, 20, 20)));
        assert!(r.contains(IntRect::new(10, 10, 20, 20)));
    }

    #[test]
    fn contains_across_rect_boundaries() {
        let mut r = SimpleEnclosedRegion::new();
        r.union(IntRect::new(0, 0, 10, 20));
        r.union(IntRect::new(10, 0, 10, 5));
        r.union(IntRect::new(10, 5, 10, 15));
        assert!(r.contains(IntRect::new(5, 5, 10, 10)));
        assert!(!r.contains(IntRect::new(15, 15, 10, 10)));
    }

    #[test]
    fn overflow_drops_smallest_and_stays_enclosed() {
        let mut r = SimpleEnclosedRegion::new();
        let mut added = Region::new();
        for i in 0..12 {
            let size = 2 + i;
            let rect = IntRect::new(i * 40, 0, size, size);
            r.union(rect);
            added.union(rect);
        }
        assert!(r.region_complexity() <= MAX_RECTS);
        // Every kept rectangle was really added.
        for kept in r.iter() {
            assert!(added.contains(*kept), "{kept:?} was never added");
        }
        // The biggest one survives.
        assert!(r.contains(IntRect::new(11 * 40, 0, 13, 13)));
        assert!(!r.contains(IntRect::new(0, 0, 2, 2)));
    }

    #[test]
    fn subtract_punches_hole() {
        let mut r = SimpleEnclosedRegion::from(IntRect::new(0, 0, 30, 30));
        r.subtract(IntRect::new(10, 10, 10, 10));
        assert_eq!(r.area(), 800);
        assert!(!r.contains_point(15, 15));
        assert!(r.contains_point(5, 5));
    }

    #[test]
    fn intersect_clips_rects() {
        let mut r = SimpleEnclosedRegion::new();
        r.union(IntRect::new(0, 0, 10, 10));
        r.union(IntRect::new(20, 0, 10, 10));
        r.intersect(IntRect::new(5, 0, 10, 10));
        assert_eq!(r.region_complexity(), 1);
        assert_eq!(r.rect(0), IntRect::new(5, 0, 5, 10));
    }

    #[test]
    fn exact_region_union_and_subtract() {
        let mut r = Region::from(IntRect::new(0, 0, 100, 100));
        r.subtract(IntRect::new(0, 0, 50, 100));
        r.subtract(IntRect::new(50, 0, 50, 50));
        assert_eq!(r.area(), 2500);
        assert_eq!(r.bounds(), IntRect::new(50, 50, 50, 50));
        r.union(IntRect::new(0, 0, 60, 60));
        assert_eq!(r.area(), 2500 + 3600 - 100);
        assert_disjoint(r.rects());
    }

    #[test]
    fn exact_region_subtract_everything_is_empty() {
        let mut r = Region::from(IntRect::new(10, 10, 10, 10));
        r.subtract(IntRect::new(0, 0, 100, 100));
        assert!(r.is_empty());
        assert_eq!(r.bounds(), IntRect::ZERO);
    }
}
