// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render surface draw properties.

use crate::geometry::IntRect;
use crate::transform::Transform3d;

use super::id::LayerId;

/// An offscreen target owned by a layer, as computed by
/// [`evaluate`](super::LayerStore::evaluate).
///
/// All rects are in whole pixels. "Target" means the render target the
/// surface itself is drawn into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSurface {
    /// Surface space to the target's space.
    pub draw_transform: Transform3d,
    /// Surface space to screen space.
    pub screen_space_transform: Transform3d,
    /// Surface space to the target's space for the reflected copy, if the
    /// owning layer has a replica.
    pub replica_draw_transform: Option<Transform3d>,
    /// Bounds of everything drawn into the surface, in surface space.
    pub content_rect: IntRect,
    /// Clip applied when drawing the surface into its target, in the target's
    /// space. `None` means unclipped.
    pub clip_rect: Option<IntRect>,
    /// Opacity applied when drawing the surface into its target.
    pub draw_opacity: f32,
    /// Whether [`draw_opacity`](Self::draw_opacity) may change under
    /// animation.
    pub draw_opacity_is_animating: bool,
    /// Whether [`draw_transform`](Self::draw_transform) may change under
    /// animation.
    pub target_transforms_are_animating: bool,
    /// Whether [`screen_space_transform`](Self::screen_space_transform) may
    /// change under animation.
    pub screen_space_transforms_are_animating: bool,
    /// Closest surface (this one included) whose contents must not be
    /// occluded by anything outside it.
    pub nearest_occlusion_immune_ancestor: Option<LayerId>,
}
