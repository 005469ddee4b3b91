// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`LayerTree`] views of a [`LayerStore`], and the walk that feeds them to
//! the tracker.

use alloc::vec::Vec;

use stratum_core::layer::{LayerId, LayerStore};
use stratum_core::region::SimpleEnclosedRegion;

use crate::iterator::LayerIteratorPosition;
use crate::tree::{LayerProperties, LayerTree, SurfaceProperties};

/// A view of an evaluated store that treats animating properties as unknown.
///
/// Use it for occlusion that must stay valid while animations run.
#[derive(Clone, Copy, Debug)]
pub struct LiveTree<'a>(pub &'a LayerStore);

/// A view of an evaluated store with all animations resolved.
///
/// Every property is taken as settled, so animating layers occlude too.
#[derive(Clone, Copy, Debug)]
pub struct CommittedTree<'a>(pub &'a LayerStore);

fn layer_properties(store: &LayerStore, layer: LayerId, committed: bool) -> LayerProperties {
    let flags = store.flags(layer);
    LayerProperties {
        draw_transform: store.draw_transform(layer),
        draw_opacity: store.draw_opacity(layer),
        opacity_known: committed || !store.draw_opacity_is_animating(layer),
        transform_to_target_known: committed || !store.draw_transform_is_animating(layer),
        // A non-normal blend gives the layer its own surface; its own content
        // is still treated as blended.
        uses_default_blend_mode: store.effects(layer).blend_mode.is_normal(),
        in_3d_rendering_context: flags.in_3d_rendering_context,
        clip_rect: store.clip_rect(layer),
    }
}

fn surface_properties(
    store: &LayerStore,
    target: LayerId,
    committed: bool,
) -> SurfaceProperties<LayerId> {
    let Some(surface) = store.render_surface(target) else {
        panic!("layer {target:?} is used as a render target but owns no surface");
    };
    let effects = store.effects(target);
    SurfaceProperties {
        draw_transform: surface.draw_transform,
        screen_space_transform: surface.screen_space_transform,
        replica_draw_transform: surface.replica_draw_transform,
        replica_has_mask: effects.replica.is_some_and(|r| r.has_mask),
        content_rect: surface.content_rect,
        clip_rect: surface.clip_rect,
        draw_opacity: surface.draw_opacity,
        opacity_known: committed || !surface.draw_opacity_is_animating,
        transforms_to_target_known: committed || !surface.target_transforms_are_animating,
        transforms_to_screen_known: committed || !surface.screen_space_transforms_are_animating,
        has_mask: effects.has_mask,
        uses_default_blend_mode: effects.blend_mode.is_normal(),
        is_only_for_copy_request: effects.copy_request && store.effective_hidden(target),
        filters_affect_opacity: effects.filters.has_filter_that_affects_opacity(),
        backdrop_filter_outsets: effects
            .backdrop_filters
            .has_filter_that_moves_pixels()
            .then(|| effects.backdrop_filters.outsets()),
        nearest_occlusion_immune_ancestor: surface.nearest_occlusion_immune_ancestor,
    }
}

macro_rules! impl_layer_tree {
    ($ty:ident, $committed:literal) => {
        impl LayerTree for $ty<'_> {
            type Id = LayerId;

            #[inline]
            fn is_root(&self, layer: LayerId) -> bool {
                self.0.is_root(layer)
            }

            #[inline]
            fn render_target(&self, layer: LayerId) -> LayerId {
                self.0.render_target(layer)
            }

            fn layer(&self, layer: LayerId) -> LayerProperties {
                layer_properties(self.0, layer, $committed)
            }

            fn visible_content_opaque_region(&self, layer: LayerId) -> SimpleEnclosedRegion {
                self.0.visible_content_opaque_region(layer)
            }

            fn surface(&self, target: LayerId) -> SurfaceProperties<LayerId> {
                surface_properties(self.0, target, $committed)
            }
        }
    };
}

impl_layer_tree!(LiveTree, false);
impl_layer_tree!(CommittedTree, true);

/// Front-to-back traversal positions for the subtree at `root`.
///
/// Within each target, later children come first. A surface's contents are
/// followed by its owning layer, the surface's
/// [`TargetSurface`](crate::Visit::TargetSurface) position and then, unless
/// it is `root`'s own surface, its
/// [`ContributingSurface`](crate::Visit::ContributingSurface) position.
/// Hidden subtrees are skipped unless the hidden layer carries a copy
/// request.
///
/// The store must be evaluated.
#[must_use]
pub fn front_to_back(store: &LayerStore, root: LayerId) -> Vec<LayerIteratorPosition<LayerId>> {
    let mut out = Vec::new();
    walk(store, root, root, &mut out);
    out
}

fn walk(
    store: &LayerStore,
    layer: LayerId,
    root: LayerId,
    out: &mut Vec<LayerIteratorPosition<LayerId>>,
) {
    if store.flags(layer).hidden && !store.effects(layer).copy_request {
        return;
    }
    for child in store.children(layer).rev() {
        walk(store, child, root, out);
    }
    out.push(LayerIteratorPosition::itself(
        layer,
        store.render_target(layer),
    ));
    if store.render_surface(layer).is_none() {
        return;
    }
    out.push(LayerIteratorPosition::target_surface(layer));
    if layer != root
        && let Some(parent) = store.parent(layer)
    {
        out.push(LayerIteratorPosition::contributing_surface(
            layer,
            store.render_target(parent),
        ));
    }
}
