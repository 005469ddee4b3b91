// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-query occlusion snapshots.

use stratum_core::geometry::IntRect;
use stratum_core::region::{Region, SimpleEnclosedRegion};
use stratum_core::transform::Transform3d;

/// The occlusion a layer or surface sees at one point of the traversal.
///
/// Pairs the occlusion of the current target with the transform from the
/// querying content into that target. Content rects passed to the queries
/// are in content space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Occlusion {
    draw_transform: Transform3d,
    occlusion_from_outside_target: SimpleEnclosedRegion,
    occlusion_from_inside_target: SimpleEnclosedRegion,
}

impl Occlusion {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(
        draw_transform: Transform3d,
        occlusion_from_outside_target: SimpleEnclosedRegion,
        occlusion_from_inside_target: SimpleEnclosedRegion,
    ) -> Self {
        Self {
            draw_transform,
            occlusion_from_outside_target,
            occlusion_from_inside_target,
        }
    }

    /// Same occlusion, seen through a different transform.
    #[must_use]
    pub fn get_occlusion_with_given_draw_transform(&self, transform: Transform3d) -> Self {
        Self {
            draw_transform: transform,
            ..self.clone()
        }
    }

    /// Content space to target space.
    #[inline]
    #[must_use]
    pub fn draw_transform(&self) -> Transform3d {
        self.draw_transform
    }

    /// Occlusion carried in from targets outside this one.
    #[inline]
    #[must_use]
    pub fn occlusion_from_outside_target(&self) -> &SimpleEnclosedRegion {
        &self.occlusion_from_outside_target
    }

    /// Occlusion from content drawn into this target.
    #[inline]
    #[must_use]
    pub fn occlusion_from_inside_target(&self) -> &SimpleEnclosedRegion {
        &self.occlusion_from_inside_target
    }

    /// Returns `true` if anything is occluded.
    #[must_use]
    pub fn has_occlusion(&self) -> bool {
        !self.occlusion_from_outside_target.is_empty()
            || !self.occlusion_from_inside_target.is_empty()
    }

    /// Returns `true` if none of `content_rect` can be seen.
    #[must_use]
    pub fn is_occluded(&self, content_rect: IntRect) -> bool {
        if content_rect.is_empty() {
            return true;
        }
        if !self.has_occlusion() || !self.draw_transform.preserves_2d_axis_alignment() {
            return false;
        }
        self.unoccluded_rect_in_target_surface(content_rect)
            .is_empty()
    }

    /// Smallest part of `content_rect` that still has to be drawn.
    #[must_use]
    pub fn get_unoccluded_content_rect(&self, content_rect: IntRect) -> IntRect {
        if !self.has_occlusion() || !self.draw_transform.preserves_2d_axis_alignment() {
            return content_rect;
        }
        let in_target = self.unoccluded_rect_in_target_surface(content_rect);
        if in_target.is_empty() {
            return IntRect::ZERO;
        }
        self.draw_transform
            .inverse()
            .and_then(|inverse| inverse.project_enclosing_clipped_rect(in_target))
            .map_or(content_rect, |r| r.intersect(content_rect))
    }

    fn unoccluded_rect_in_target_surface(&self, content_rect: IntRect) -> IntRect {
        let mut unoccluded = Region::from(
            self.draw_transform
                .map_enclosing_clipped_rect(content_rect),
        );
        for r in self
            .occlusion_from_inside_target
            .iter()
            .chain(self.occlusion_from_outside_target.iter())
        {
            unoccluded.subtract(*r);
        }
        unoccluded.bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occluded(inside: IntRect, outside: IntRect) -> Occlusion {
        Occlusion::new(
            Transform3d::IDENTITY,
            SimpleEnclosedRegion::from(outside),
            SimpleEnclosedRegion::from(inside),
        )
    }

    #[test]
    fn empty_occlusion_leaves_content_alone() {
        let occlusion = Occlusion::default();
        let rect = IntRect::new(3, 4, 10, 10);
        assert!(!occlusion.has_occlusion(), "default has no occlusion");
        assert!(!occlusion.is_occluded(rect), "nothing hides the rect");
        assert_eq!(occlusion.get_unoccluded_content_rect(rect), rect);
    }

    #[test]
    fn empty_content_is_occluded() {
        assert!(
            Occlusion::default().is_occluded(IntRect::ZERO),
            "empty rects are trivially hidden"
        );
    }

    #[test]
    fn inside_and_outside_both_occlude() {
        let occlusion = occluded(IntRect::new(0, 0, 50, 100), IntRect::new(50, 0, 50, 100));
        assert!(occlusion.is_occluded(IntRect::new(10, 10, 80, 80)), "covered by the pair");
        assert_eq!(
            occlusion.get_unoccluded_content_rect(IntRect::new(0, 50, 100, 100)),
            IntRect::new(0, 100, 100, 50)
        );
    }

    #[test]
    fn partial_overlap_trims_to_bounds_of_visible_part() {
        let occlusion = occluded(IntRect::new(0, 0, 60, 100), IntRect::ZERO);
        assert_eq!(
            occlusion.get_unoccluded_content_rect(IntRect::new(0, 0, 100, 100)),
            IntRect::new(60, 0, 40, 100)
        );
        // An occluder in the middle leaves two pieces; their bounds come back.
        let hole = occluded(IntRect::new(40, 0, 20, 100), IntRect::ZERO);
        assert_eq!(
            hole.get_unoccluded_content_rect(IntRect::new(0, 0, 100, 100)),
            IntRect::new(0, 0, 100, 100)
        );
    }

    #[test]
    fn draw_transform_maps_content_into_target() {
        let occlusion = occluded(IntRect::new(100, 100, 50, 50), IntRect::ZERO)
            .get_occlusion_with_given_draw_transform(Transform3d::from_translation(
                100.0, 100.0, 0.0,
            ));
        assert!(occlusion.is_occluded(IntRect::new(0, 0, 50, 50)), "translated onto occluder");
        assert_eq!(
            occlusion.get_unoccluded_content_rect(IntRect::new(0, 0, 50, 80)),
            IntRect::new(0, 50, 50, 30)
        );
    }

    #[test]
    fn scaled_content_projects_back() {
        let occlusion = occluded(IntRect::new(0, 0, 100, 50), IntRect::ZERO)
            .get_occlusion_with_given_draw_transform(Transform3d::from_scale(2.0, 2.0, 1.0));
        assert_eq!(
            occlusion.get_unoccluded_content_rect(IntRect::new(0, 0, 50, 50)),
            IntRect::new(0, 25, 50, 25)
        );
    }

    #[test]
    fn rotated_content_is_never_occluded() {
        let occlusion = occluded(IntRect::new(-1000, -1000, 2000, 2000), IntRect::ZERO)
            .get_occlusion_with_given_draw_transform(Transform3d::from_rotation_z(0.3));
        let rect = IntRect::new(0, 0, 10, 10);
        assert!(!occlusion.is_occluded(rect), "non-axis-aligned content is not tested");
        assert_eq!(occlusion.get_unoccluded_content_rect(rect), rect);
    }
}
