// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability interface the tracker reads layer state through.

use core::fmt::Debug;

use stratum_core::effects::FilterOutsets;
use stratum_core::geometry::IntRect;
use stratum_core::region::SimpleEnclosedRegion;
use stratum_core::transform::Transform3d;

/// Draw properties of a layer, as seen from its render target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerProperties {
    /// Layer space to target space.
    pub draw_transform: Transform3d,
    /// Opacity within the target.
    pub draw_opacity: f32,
    /// `false` while the opacity may change without a new traversal.
    pub opacity_known: bool,
    /// `false` while the draw transform may change without a new traversal.
    pub transform_to_target_known: bool,
    /// The layer composites with normal blending.
    pub uses_default_blend_mode: bool,
    /// The layer is depth-sorted with others, so draw order is not final.
    pub in_3d_rendering_context: bool,
    /// Clip in target space, if clipped.
    pub clip_rect: Option<IntRect>,
}

impl LayerProperties {
    /// Opaque, unclipped, settled properties with the given transform.
    #[must_use]
    pub const fn new(draw_transform: Transform3d) -> Self {
        Self {
            draw_transform,
            draw_opacity: 1.0,
            opacity_known: true,
            transform_to_target_known: true,
            uses_default_blend_mode: true,
            in_3d_rendering_context: false,
            clip_rect: None,
        }
    }
}

/// Properties of a render target's surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceProperties<Id> {
    /// Surface space to the space of the target it draws into.
    pub draw_transform: Transform3d,
    /// Surface space to screen space.
    pub screen_space_transform: Transform3d,
    /// Placement of the reflected copy in the parent target, if any.
    pub replica_draw_transform: Option<Transform3d>,
    /// The reflected copy is drawn through a mask.
    pub replica_has_mask: bool,
    /// Area the surface's contents cover, in surface space.
    pub content_rect: IntRect,
    /// Clip in the parent target's space, if clipped.
    pub clip_rect: Option<IntRect>,
    /// Opacity the surface is drawn with.
    pub draw_opacity: f32,
    /// `false` while the opacity may change.
    pub opacity_known: bool,
    /// `false` while the transform into the parent target may change.
    pub transforms_to_target_known: bool,
    /// `false` while the transform to screen may change.
    pub transforms_to_screen_known: bool,
    /// The surface is drawn through a mask.
    pub has_mask: bool,
    /// The surface composites with normal blending.
    pub uses_default_blend_mode: bool,
    /// The surface is hidden and exists only to service a readback.
    pub is_only_for_copy_request: bool,
    /// A filter on the surface may change alpha.
    pub filters_affect_opacity: bool,
    /// Reach of the surface's pixel-moving backdrop filters, if it has any.
    pub backdrop_filter_outsets: Option<FilterOutsets>,
    /// Closest target at or above this one whose subtree ignores occlusion
    /// from outside it.
    pub nearest_occlusion_immune_ancestor: Option<Id>,
}

impl<Id> SurfaceProperties<Id> {
    /// Untransformed, opaque, effect-free surface covering `content_rect`.
    #[must_use]
    pub const fn new(content_rect: IntRect) -> Self {
        Self {
            draw_transform: Transform3d::IDENTITY,
            screen_space_transform: Transform3d::IDENTITY,
            replica_draw_transform: None,
            replica_has_mask: false,
            content_rect,
            clip_rect: None,
            draw_opacity: 1.0,
            opacity_known: true,
            transforms_to_target_known: true,
            transforms_to_screen_known: true,
            has_mask: false,
            uses_default_blend_mode: true,
            is_only_for_copy_request: false,
            filters_affect_opacity: false,
            backdrop_filter_outsets: None,
            nearest_occlusion_immune_ancestor: None,
        }
    }
}

/// Read access to a tree of layers and render targets.
///
/// Implemented once per tree representation; the tracker's logic is shared.
pub trait LayerTree {
    /// Layer handle.
    type Id: Copy + Eq + Debug;

    /// Returns `true` if `layer` has no parent.
    fn is_root(&self, layer: Self::Id) -> bool;

    /// The render target `layer` draws into. A target is its own target.
    fn render_target(&self, layer: Self::Id) -> Self::Id;

    /// Draw properties of `layer`.
    fn layer(&self, layer: Self::Id) -> LayerProperties;

    /// Part of `layer`'s visible content known to be opaque, in layer space.
    fn visible_content_opaque_region(&self, layer: Self::Id) -> SimpleEnclosedRegion;

    /// Surface properties of a render target.
    ///
    /// Only called with ids returned by [`render_target`](Self::render_target).
    fn surface(&self, target: Self::Id) -> SurfaceProperties<Self::Id>;
}

impl<T: LayerTree + ?Sized> LayerTree for &T {
    type Id = T::Id;

    #[inline]
    fn is_root(&self, layer: Self::Id) -> bool {
        (**self).is_root(layer)
    }

    #[inline]
    fn render_target(&self, layer: Self::Id) -> Self::Id {
        (**self).render_target(layer)
    }

    #[inline]
    fn layer(&self, layer: Self::Id) -> LayerProperties {
        (**self).layer(layer)
    }

    #[inline]
    fn visible_content_opaque_region(&self, layer: Self::Id) -> SimpleEnclosedRegion {
        (**self).visible_content_opaque_region(layer)
    }

    #[inline]
    fn surface(&self, target: Self::Id) -> SurfaceProperties<Self::Id> {
        (**self).surface(target)
    }
}
