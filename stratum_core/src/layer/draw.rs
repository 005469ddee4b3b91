// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw-property computation.
//!
//! Two passes over the traversal order:
//!
//! 1. **Top-down**: assign render targets, then derive draw/screen
//!    transforms, draw opacities, clips and visible content rects from the
//!    parent's already-computed state. Layers that need one get a
//!    [`RenderSurface`] whose space is the owning layer's local space.
//! 2. **Bottom-up**: accumulate each surface's content rect from the
//!    drawable footprints of the layers and child surfaces drawn into it.

use crate::geometry::IntRect;
use crate::transform::Transform3d;

use super::evaluate::FrameChanges;
use super::id::INVALID;
use super::store::LayerStore;
use super::surface::RenderSurface;

/// Per-layer draw properties.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DrawState {
    pub(crate) render_target: u32,
    pub(crate) draw_transform: Transform3d,
    pub(crate) screen_space_transform: Transform3d,
    pub(crate) draw_opacity: f32,
    pub(crate) draw_opacity_animating: bool,
    pub(crate) draw_transform_animating: bool,
    pub(crate) screen_space_transform_animating: bool,
    /// Clip on the layer's own content, in target space.
    pub(crate) clip_rect: Option<IntRect>,
    /// Clip inherited by children, in the space of the target children of
    /// this layer draw into.
    pub(crate) descendant_clip: Option<IntRect>,
    pub(crate) visible_content_rect: IntRect,
    /// Hidden for drawing purposes. Unlike effective hidden state this is
    /// reset below a copy request.
    pub(crate) skips_drawing: bool,
}

impl DrawState {
    pub(crate) const INITIAL: Self = Self {
        render_target: INVALID,
        draw_transform: Transform3d::IDENTITY,
        screen_space_transform: Transform3d::IDENTITY,
        draw_opacity: 1.0,
        draw_opacity_animating: false,
        draw_transform_animating: false,
        screen_space_transform_animating: false,
        clip_rect: None,
        descendant_clip: None,
        visible_content_rect: IntRect::ZERO,
        skips_drawing: false,
    };
}

fn intersect_clips(a: Option<IntRect>, b: Option<IntRect>) -> Option<IntRect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.intersect(b)),
        (a, b) => a.or(b),
    }
}

impl LayerStore {
    /// Returns `true` if the non-root layer at `idx` needs its own surface.
    fn needs_render_surface(&self, idx: u32) -> bool {
        let i = idx as usize;
        let flags = self.flags[i];
        let group_opacity = self.first_child[i] != INVALID
            && (self.local_opacity[i] < 1.0 || flags.opacity_animating);
        flags.force_render_surface || self.effects[i].needs_render_surface() || group_opacity
    }

    /// Recomputes draw properties for every live layer.
    pub(crate) fn update_draw_properties(&mut self, changes: &mut FrameChanges) {
        let order = core::mem::take(&mut self.traversal_order);
        for &idx in &order {
            self.compute_layer(idx, changes);
        }
        for &idx in order.iter().rev() {
            self.accumulate_content_rect(idx);
        }
        self.traversal_order = order;
    }

    fn compute_layer(&mut self, idx: u32, changes: &mut FrameChanges) {
        let i = idx as usize;
        let p = self.parent[i];
        let flags = self.flags[i];
        let local = self.local_transform[i];
        let opacity = self.local_opacity[i];
        let copy_request = self.effects[i].copy_request;
        let parent = (p != INVALID).then(|| self.draw[p as usize]);

        let hidden = (p != INVALID && self.effective_hidden[p as usize]) || flags.hidden;
        if hidden != self.effective_hidden[i] {
            if hidden {
                changes.hidden.push(idx);
            } else {
                changes.unhidden.push(idx);
            }
            self.effective_hidden[i] = hidden;
        }

        let screen_space_transform = parent.map_or(local, |d| d.screen_space_transform * local);
        let screen_space_transform_animating =
            parent.is_some_and(|d| d.screen_space_transform_animating) || flags.transform_animating;

        let mut state = match parent {
            Some(d) if !self.needs_render_surface(idx) => {
                self.surface[i] = None;
                let draw_transform = d.draw_transform * local;
                let own_clip = self.clip[i]
                    .map(|c| IntRect::enclosing(draw_transform.map_clipped_rect(c)));
                DrawState {
                    render_target: d.render_target,
                    draw_transform,
                    screen_space_transform,
                    draw_opacity: d.draw_opacity * opacity,
                    draw_opacity_animating: d.draw_opacity_animating || flags.opacity_animating,
                    draw_transform_animating: d.draw_transform_animating
                        || flags.transform_animating,
                    screen_space_transform_animating,
                    clip_rect: d.descendant_clip,
                    descendant_clip: intersect_clips(d.descendant_clip, own_clip),
                    visible_content_rect: IntRect::ZERO,
                    skips_drawing: d.skips_drawing || flags.hidden,
                }
            }
            _ => {
                let surface = match parent {
                    None => RenderSurface {
                        draw_transform: local,
                        screen_space_transform,
                        replica_draw_transform: None,
                        content_rect: IntRect::ZERO,
                        clip_rect: None,
                        draw_opacity: opacity,
                        draw_opacity_is_animating: flags.opacity_animating,
                        target_transforms_are_animating: flags.transform_animating,
                        screen_space_transforms_are_animating: screen_space_transform_animating,
                        nearest_occlusion_immune_ancestor: None,
                    },
                    Some(d) => {
                        let draw_transform = d.draw_transform * local;
                        let parent_immune = self.surface[d.render_target as usize]
                            .as_ref()
                            .and_then(|s| s.nearest_occlusion_immune_ancestor);
                        RenderSurface {
                            draw_transform,
                            screen_space_transform,
                            replica_draw_transform: None,
                            content_rect: IntRect::ZERO,
                            clip_rect: d.descendant_clip,
                            draw_opacity: d.draw_opacity * opacity,
                            draw_opacity_is_animating: d.draw_opacity_animating
                                || flags.opacity_animating,
                            target_transforms_are_animating: d.draw_transform_animating
                                || flags.transform_animating,
                            screen_space_transforms_are_animating: screen_space_transform_animating,
                            nearest_occlusion_immune_ancestor: parent_immune,
                        }
                    }
                };
                let replica_draw_transform = self.effects[i]
                    .replica
                    .map(|r| surface.draw_transform * r.transform);
                let nearest_occlusion_immune_ancestor = if copy_request {
                    Some(self.id_at(idx))
                } else {
                    surface.nearest_occlusion_immune_ancestor
                };
                self.surface[i] = Some(RenderSurface {
                    replica_draw_transform,
                    nearest_occlusion_immune_ancestor,
                    ..surface
                });
                let parent_skips = parent.is_some_and(|d| d.skips_drawing);
                DrawState {
                    render_target: idx,
                    draw_transform: Transform3d::IDENTITY,
                    screen_space_transform,
                    draw_opacity: 1.0,
                    draw_opacity_animating: false,
                    draw_transform_animating: false,
                    screen_space_transform_animating,
                    clip_rect: None,
                    descendant_clip: self.clip[i].map(IntRect::enclosing),
                    visible_content_rect: IntRect::ZERO,
                    skips_drawing: !copy_request && (parent_skips || flags.hidden),
                }
            }
        };

        let bounds = IntRect::from_size(self.bounds[i]);
        state.visible_content_rect = match state.clip_rect {
            None => bounds,
            Some(clip) => state
                .draw_transform
                .inverse()
                .and_then(|inv| inv.project_enclosing_clipped_rect(clip))
                .map_or(bounds, |r| r.intersect(bounds)),
        };
        self.draw[i] = state;
    }

    fn accumulate_content_rect(&mut self, idx: u32) {
        let i = idx as usize;
        let state = self.draw[i];

        if !state.skips_drawing && !self.bounds[i].is_empty() {
            let mut drawable = state
                .draw_transform
                .map_enclosing_clipped_rect(state.visible_content_rect);
            if let Some(clip) = state.clip_rect {
                drawable = drawable.intersect(clip);
            }
            if let Some(target) = self.surface[state.render_target as usize].as_mut() {
                target.content_rect = target.content_rect.union(drawable);
            }
        }

        let p = self.parent[i];
        if p == INVALID || self.draw[p as usize].skips_drawing || self.flags[i].hidden {
            return;
        }
        let Some(surface) = self.surface[i] else {
            return;
        };
        let mut footprint = surface
            .draw_transform
            .map_enclosing_clipped_rect(surface.content_rect);
        if let Some(replica) = surface.replica_draw_transform {
            footprint = footprint.union(replica.map_enclosing_clipped_rect(surface.content_rect));
        }
        if let Some(clip) = surface.clip_rect {
            footprint = footprint.intersect(clip);
        }
        let target = self.draw[p as usize].render_target;
        if let Some(target) = self.surface[target as usize].as_mut() {
            target.content_rect = target.content_rect.union(footprint);
        }
    }
}
