// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render-target stack.
//!
//! One stack entry per render target that is open in the traversal. Each
//! entry keeps two regions in that target's space:
//!
//! - **outside**: occlusion inherited from targets further out, transformed
//!   in when the target was entered;
//! - **inside**: occlusion from content already drawn into this target.
//!
//! When a target is left, both are transformed into the next target and
//! merged there, unless effects on the surface make its contents unable to
//! hide anything behind it.

use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "trace-rich")]
use stratum_core::trace::OccluderEvent;
use stratum_core::effects::FilterOutsets;
use stratum_core::geometry::{IntRect, IntSize};
use stratum_core::region::{Region, SimpleEnclosedRegion};
use stratum_core::trace::{ClearReason, OcclusionClearedEvent, RenderTargetEvent, StackOp, Tracer};
use stratum_core::transform::Transform3d;

use crate::iterator::{LayerIteratorPosition, Visit};
use crate::occlusion::Occlusion;
use crate::tree::{LayerTree, SurfaceProperties};

/// Traversal-wide settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OcclusionConfig {
    /// The part of the screen that is drawn at all.
    pub screen_space_clip_rect: IntRect,
    /// Occluders smaller than this in both dimensions are ignored.
    pub minimum_tracking_size: IntSize,
}

impl OcclusionConfig {
    /// Tracks every occluder inside `screen_space_clip_rect`.
    #[must_use]
    pub const fn new(screen_space_clip_rect: IntRect) -> Self {
        Self {
            screen_space_clip_rect,
            minimum_tracking_size: IntSize::ZERO,
        }
    }

    /// Sets [`minimum_tracking_size`](Self::minimum_tracking_size).
    #[must_use]
    pub const fn with_minimum_tracking_size(mut self, size: IntSize) -> Self {
        self.minimum_tracking_size = size;
        self
    }
}

impl Default for OcclusionConfig {
    fn default() -> Self {
        Self::new(IntRect::ZERO)
    }
}

#[derive(Clone, Debug)]
struct StackObject<Id> {
    target: Id,
    occlusion_from_outside_target: SimpleEnclosedRegion,
    occlusion_from_inside_target: SimpleEnclosedRegion,
}

impl<Id> StackObject<Id> {
    fn new(target: Id) -> Self {
        Self {
            target,
            occlusion_from_outside_target: SimpleEnclosedRegion::new(),
            occlusion_from_inside_target: SimpleEnclosedRegion::new(),
        }
    }
}

/// The screen clip in `surface`'s space.
///
/// Falls back to the surface's content rect when the screen transform cannot
/// be inverted.
#[must_use]
pub fn screen_space_clip_rect_in_target_surface<Id>(
    surface: &SurfaceProperties<Id>,
    screen_space_clip_rect: IntRect,
) -> IntRect {
    surface
        .screen_space_transform
        .inverse()
        .and_then(|inverse| inverse.project_enclosing_clipped_rect(screen_space_clip_rect))
        .unwrap_or(surface.content_rect)
}

/// Moves a region into another space, rect by rect.
///
/// Returns an empty region when the transform would turn rects into
/// non-rects. Each rect shrinks to the pixels it fully covers.
fn transform_surface_opaque_region(
    region: &SimpleEnclosedRegion,
    clip_rect_in_new_target: Option<IntRect>,
    transform: Transform3d,
) -> SimpleEnclosedRegion {
    if region.is_empty() || !transform.preserves_2d_axis_alignment() {
        return SimpleEnclosedRegion::new();
    }
    let mut out = SimpleEnclosedRegion::new();
    for r in region.iter() {
        let mut mapped = transform.map_enclosed_rect_with_2d_axis_aligned_transform(*r);
        if let Some(clip) = clip_rect_in_new_target {
            mapped = mapped.intersect(clip);
        }
        out.union(mapped);
    }
    out
}

/// Gives back occlusion a pixel-moving backdrop filter can see through.
///
/// Occlusion inside the filtered footprint (grown by the filter's reach)
/// shrinks by the reach on every side that does not touch the footprint's
/// edge.
fn reduce_occlusion_below_surface(
    surface_rect: IntRect,
    surface_transform: Transform3d,
    surface_clip: Option<IntRect>,
    outsets: FilterOutsets,
    occlusion: &mut SimpleEnclosedRegion,
) {
    if surface_rect.is_empty() {
        return;
    }
    let mut affected = surface_transform.map_enclosing_clipped_rect(surface_rect);
    if let Some(clip) = surface_clip {
        affected = affected.intersect(clip);
    }
    if affected.is_empty() {
        return;
    }
    // The filter reads pixels from beyond the clip too.
    affected = affected.inset(-outsets.left, -outsets.top, -outsets.right, -outsets.bottom);

    let mut affected_occlusion = occlusion.clone();
    affected_occlusion.intersect(affected);
    occlusion.subtract(affected);
    for r in affected_occlusion.iter() {
        // A left outset pulls in pixels from the right, so it eats the right
        // edge, and so on.
        let shrink_left = if r.x == affected.x { 0 } else { outsets.right };
        let shrink_top = if r.y == affected.y { 0 } else { outsets.bottom };
        let shrink_right = if r.right() == affected.right() {
            0
        } else {
            outsets.left
        };
        let shrink_bottom = if r.bottom() == affected.bottom() {
            0
        } else {
            outsets.top
        };
        occlusion.union(r.inset(shrink_left, shrink_top, shrink_right, shrink_bottom));
    }
}

/// Accumulates occlusion over a front-to-back traversal.
///
/// Drive it with [`enter_layer`](Self::enter_layer) and
/// [`leave_layer`](Self::leave_layer) for every position of the walk, or with
/// the individual stack operations. Query with
/// [`get_current_occlusion_for_layer`](Self::get_current_occlusion_for_layer)
/// between the two calls for a position.
pub struct OcclusionTracker<'a, T: LayerTree> {
    tree: T,
    config: OcclusionConfig,
    stack: Vec<StackObject<T::Id>>,
    tracer: Tracer<'a>,
}

impl<T: LayerTree> fmt::Debug for OcclusionTracker<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcclusionTracker")
            .field("config", &self.config)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

impl<'a, T: LayerTree> OcclusionTracker<'a, T> {
    /// Creates a tracker with an empty stack.
    #[must_use]
    pub fn new(tree: T, config: OcclusionConfig) -> Self {
        Self {
            tree,
            config,
            stack: Vec::new(),
            tracer: Tracer::none(),
        }
    }

    /// Routes events to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer<'a>) -> Self {
        self.tracer = tracer;
        self
    }

    /// The tree being traversed.
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// The active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> OcclusionConfig {
        self.config
    }

    /// Number of open render targets.
    #[inline]
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// The innermost open render target.
    #[inline]
    #[must_use]
    pub fn current_target(&self) -> Option<T::Id> {
        self.stack.last().map(|s| s.target)
    }

    /// Occlusion from content drawn into the innermost target so far.
    ///
    /// # Panics
    ///
    /// Panics if no target is open.
    #[must_use]
    pub fn occlusion_from_inside_target(&self) -> &SimpleEnclosedRegion {
        &self.top().occlusion_from_inside_target
    }

    /// Occlusion the innermost target inherited from outside.
    ///
    /// # Panics
    ///
    /// Panics if no target is open.
    #[must_use]
    pub fn occlusion_from_outside_target(&self) -> &SimpleEnclosedRegion {
        &self.top().occlusion_from_outside_target
    }

    /// Occlusion for content about to be drawn into the innermost target.
    ///
    /// # Panics
    ///
    /// Panics if no target is open.
    #[must_use]
    pub fn get_current_occlusion_for_layer(&self, draw_transform: Transform3d) -> Occlusion {
        let top = self.top();
        Occlusion::new(
            draw_transform,
            top.occlusion_from_outside_target.clone(),
            top.occlusion_from_inside_target.clone(),
        )
    }

    /// Occlusion for the innermost target's surface, as drawn into its
    /// parent target.
    ///
    /// A surface is not occluded by its own contents, so this reads the entry
    /// below the top. Empty when there is none.
    #[must_use]
    pub fn get_current_occlusion_for_contributing_surface(
        &self,
        draw_transform: Transform3d,
    ) -> Occlusion {
        let n = self.stack.len();
        if n < 2 {
            return Occlusion::default();
        }
        let below = &self.stack[n - 2];
        Occlusion::new(
            draw_transform,
            below.occlusion_from_outside_target.clone(),
            below.occlusion_from_inside_target.clone(),
        )
    }

    /// Pre-visit step for a traversal position.
    pub fn enter_layer(&mut self, position: &LayerIteratorPosition<T::Id>) {
        match position.visit {
            Visit::Itself => self.enter_render_target(position.target),
            Visit::TargetSurface => self.finished_render_target(position.target),
            Visit::ContributingSurface => {}
        }
    }

    /// Post-visit step for a traversal position.
    pub fn leave_layer(&mut self, position: &LayerIteratorPosition<T::Id>) {
        match position.visit {
            Visit::Itself => self.mark_occluded_behind_layer(position.current_layer),
            Visit::TargetSurface => {}
            Visit::ContributingSurface => self.leave_to_render_target(position.target),
        }
    }

    /// Makes `new_target` the innermost target.
    ///
    /// Does nothing if it already is. Otherwise pushes an entry and seeds its
    /// outside occlusion with everything known in the previous target,
    /// unless the new target is the root, starts an occlusion-immune subtree,
    /// or has no known inverse screen transform.
    pub fn enter_render_target(&mut self, new_target: T::Id) {
        if self.current_target() == Some(new_target) {
            return;
        }
        let old_target = self.current_target();
        let old_immune =
            old_target.and_then(|t| self.tree.surface(t).nearest_occlusion_immune_ancestor);
        let new_surface = self.tree.surface(new_target);
        let new_immune = new_surface.nearest_occlusion_immune_ancestor;

        self.stack.push(StackObject::new(new_target));
        self.tracer.render_target(&RenderTargetEvent {
            op: StackOp::Enter,
            stack_depth: self.stack.len(),
        });

        let Some(old_target) = old_target else {
            return;
        };
        let entering_unoccluded_subtree = new_immune.is_some() && new_immune != old_immune;
        if entering_unoccluded_subtree || self.tree.is_root(new_target) {
            return;
        }
        let inverse_screen = if new_surface.transforms_to_screen_known {
            new_surface.screen_space_transform.inverse()
        } else {
            None
        };
        let Some(inverse_screen) = inverse_screen else {
            return;
        };

        let old_to_new = inverse_screen * self.tree.surface(old_target).screen_space_transform;
        let [.., previous, current] = self.stack.as_mut_slice() else {
            return;
        };
        let mut outside = transform_surface_opaque_region(
            &previous.occlusion_from_outside_target,
            None,
            old_to_new,
        );
        outside.union_region(&transform_surface_opaque_region(
            &previous.occlusion_from_inside_target,
            None,
            old_to_new,
        ));
        current.occlusion_from_outside_target = outside;
    }

    /// Closes the contents of `finished_target`.
    ///
    /// Drops the target's occlusion when its surface cannot hide what is
    /// behind it: masked, translucent or animating opacity, non-normal blend,
    /// hidden copy-request-only, alpha-changing filters, or an animating
    /// transform into its parent.
    pub fn finished_render_target(&mut self, finished_target: T::Id) {
        self.enter_render_target(finished_target);
        let surface = self.tree.surface(finished_target);

        let reason = if surface.has_mask {
            Some(ClearReason::Mask)
        } else if !surface.opacity_known || surface.draw_opacity < 1.0 {
            Some(ClearReason::Opacity)
        } else if !surface.uses_default_blend_mode {
            Some(ClearReason::BlendMode)
        } else if surface.is_only_for_copy_request {
            Some(ClearReason::CopyRequest)
        } else if surface.filters_affect_opacity {
            Some(ClearReason::Filters)
        } else if !surface.transforms_to_target_known {
            Some(ClearReason::TransformUnknown)
        } else {
            None
        };

        let stack_depth = self.stack.len();
        if let Some(reason) = reason {
            let top = self.top_mut();
            top.occlusion_from_outside_target.clear();
            top.occlusion_from_inside_target.clear();
            self.tracer
                .occlusion_cleared(&OcclusionClearedEvent { reason, stack_depth });
        }
        self.tracer.render_target(&RenderTargetEvent {
            op: StackOp::Finish,
            stack_depth,
        });
    }

    /// Merges the innermost target into `new_target`.
    ///
    /// Pops the entry when `new_target` is directly below it; otherwise the
    /// top entry becomes `new_target`'s. Outside occlusion is dropped when
    /// `new_target` is the root. A pixel-moving backdrop filter on the left
    /// surface then gives back occlusion under its footprint and its
    /// replica's.
    ///
    /// # Panics
    ///
    /// Panics if no target is open.
    pub fn leave_to_render_target(&mut self, new_target: T::Id) {
        let old = self.top();
        let old_target = old.target;
        let old_surface = self.tree.surface(old_target);

        let mut inside_in_new_target = transform_surface_opaque_region(
            &old.occlusion_from_inside_target,
            old_surface.clip_rect,
            old_surface.draw_transform,
        );
        if let Some(replica) = old_surface.replica_draw_transform
            && !old_surface.replica_has_mask
        {
            inside_in_new_target.union_region(&transform_surface_opaque_region(
                &old.occlusion_from_inside_target,
                old_surface.clip_rect,
                replica,
            ));
        }
        let outside_in_new_target = transform_surface_opaque_region(
            &old.occlusion_from_outside_target,
            None,
            old_surface.draw_transform,
        );

        let mut unoccluded_surface_rect = IntRect::ZERO;
        let mut unoccluded_replica_rect = IntRect::ZERO;
        if old_surface.backdrop_filter_outsets.is_some() {
            unoccluded_surface_rect = self
                .get_current_occlusion_for_contributing_surface(old_surface.draw_transform)
                .get_unoccluded_content_rect(old_surface.content_rect);
            if let Some(replica) = old_surface.replica_draw_transform {
                unoccluded_replica_rect = self
                    .get_current_occlusion_for_contributing_surface(replica)
                    .get_unoccluded_content_rect(old_surface.content_rect);
            }
        }

        let keep_outside = !self.tree.is_root(new_target);
        let n = self.stack.len();
        if n > 1 && self.stack[n - 2].target == new_target {
            let below = &mut self.stack[n - 2];
            below
                .occlusion_from_inside_target
                .union_region(&inside_in_new_target);
            if keep_outside {
                below
                    .occlusion_from_outside_target
                    .union_region(&outside_in_new_target);
            }
            self.stack.pop();
        } else {
            let top = self.top_mut();
            top.target = new_target;
            top.occlusion_from_inside_target = inside_in_new_target;
            top.occlusion_from_outside_target = if keep_outside {
                outside_in_new_target
            } else {
                SimpleEnclosedRegion::new()
            };
        }
        self.tracer.render_target(&RenderTargetEvent {
            op: StackOp::Leave,
            stack_depth: self.stack.len(),
        });

        let Some(outsets) = old_surface.backdrop_filter_outsets else {
            return;
        };
        let replica_footprint = old_surface
            .replica_draw_transform
            .map(|replica| (unoccluded_replica_rect, replica));
        let footprints =
            core::iter::once((unoccluded_surface_rect, old_surface.draw_transform))
                .chain(replica_footprint);
        let top = self.top_mut();
        for (rect, transform) in footprints {
            reduce_occlusion_below_surface(
                rect,
                transform,
                old_surface.clip_rect,
                outsets,
                &mut top.occlusion_from_inside_target,
            );
            reduce_occlusion_below_surface(
                rect,
                transform,
                old_surface.clip_rect,
                outsets,
                &mut top.occlusion_from_outside_target,
            );
        }
    }

    /// Records the opaque content of `layer` as occluding its target.
    ///
    /// Contributes nothing unless the layer is opaque with settled opacity
    /// and transform, blends normally, is not depth-sorted, and maps rects to
    /// rects. Opaque rects are clipped to the layer's clip (or the target's
    /// content) and to the screen clip, and those smaller than the minimum
    /// tracking size in both dimensions are dropped.
    ///
    /// # Panics
    ///
    /// Panics if no target is open.
    pub fn mark_occluded_behind_layer(&mut self, layer: T::Id) {
        let target = self.top().target;
        debug_assert_eq!(
            self.tree.render_target(layer),
            target,
            "layer must draw into the innermost open target"
        );

        let props = self.tree.layer(layer);
        if !props.opacity_known
            || props.draw_opacity < 1.0
            || !props.uses_default_blend_mode
            || props.in_3d_rendering_context
            || !props.transform_to_target_known
        {
            return;
        }
        let opaque = self.tree.visible_content_opaque_region(layer);
        if opaque.is_empty() || !props.draw_transform.preserves_2d_axis_alignment() {
            return;
        }

        let surface = self.tree.surface(target);
        let mut clip_rect_in_target =
            screen_space_clip_rect_in_target_surface(&surface, self.config.screen_space_clip_rect);
        clip_rect_in_target =
            clip_rect_in_target.intersect(props.clip_rect.unwrap_or(surface.content_rect));

        let min = self.config.minimum_tracking_size;
        for r in opaque.iter() {
            let rect = props
                .draw_transform
                .map_enclosed_rect_with_2d_axis_aligned_transform(*r)
                .intersect(clip_rect_in_target);
            let accepted =
                !rect.is_empty() && (rect.width >= min.width || rect.height >= min.height);
            #[cfg(feature = "trace-rich")]
            self.tracer.occluder(&OccluderEvent { rect, accepted });
            if accepted {
                self.top_mut().occlusion_from_inside_target.union(rect);
            }
        }
    }

    /// Visible part of the screen once the traversal is back at the root.
    ///
    /// The screen clip minus the root target's occlusion, exactly.
    ///
    /// # Panics
    ///
    /// Panics if no target is open. In debug builds, also panics if the
    /// innermost target is not the root.
    #[must_use]
    pub fn compute_visible_region_in_screen(&self) -> Region {
        let top = self.top();
        debug_assert!(
            self.tree.is_root(top.target),
            "visible region is only defined once the traversal is back at the root"
        );
        let mut visible = Region::from(self.config.screen_space_clip_rect);
        for r in top.occlusion_from_inside_target.iter() {
            visible.subtract(*r);
        }
        visible
    }

    fn top(&self) -> &StackObject<T::Id> {
        assert!(!self.stack.is_empty(), "occlusion stack is empty");
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut StackObject<T::Id> {
        assert!(!self.stack.is_empty(), "occlusion stack is empty");
        let n = self.stack.len();
        &mut self.stack[n - 1]
    }
}
