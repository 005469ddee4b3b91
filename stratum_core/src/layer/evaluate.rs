// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and change tracking.
//!
//! Evaluation drains every dirty channel into [`FrameChanges`]. If anything
//! at all changed, draw properties are then recomputed for the whole tree
//! (see the `draw` module): one dirty opacity can create or remove a render
//! surface and thereby move the render target of an entire subtree, so
//! per-layer patching is not sound.
//!
//! [`FrameChanges`] uses raw slot indices (`u32`) rather than [`LayerId`]
//! handles; [`LayerId::index`] maps a handle to the same space.
//!
//! [`LayerId`]: super::LayerId
//! [`LayerId::index`]: super::LayerId::index

use alloc::vec::Vec;

use understory_dirty::Channel;

use super::id::INVALID;
use super::store::LayerStore;
use crate::dirty;

/// The set of changes produced by a single [`LayerStore::evaluate`] call.
///
/// Each field contains the raw slot indices of layers that changed in the
/// corresponding category.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Layers whose transform or flags were marked (including descendants).
    pub transforms: Vec<u32>,
    /// Layers whose opacity was marked (including descendants).
    pub opacities: Vec<u32>,
    /// Layers whose clip changed.
    pub clips: Vec<u32>,
    /// Layers whose bounds or opaque content changed.
    pub content: Vec<u32>,
    /// Layers whose effects changed.
    pub effects: Vec<u32>,
    /// Layers that transitioned from visible to effectively hidden.
    pub hidden: Vec<u32>,
    /// Layers that transitioned from effectively hidden to visible.
    pub unhidden: Vec<u32>,
    /// Layers added since the last evaluate.
    pub added: Vec<u32>,
    /// Layers removed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
    /// Whether draw properties were recomputed.
    pub draw_properties_updated: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.opacities.clear();
        self.clips.clear();
        self.content.clear();
        self.effects.clear();
        self.hidden.clear();
        self.unhidden.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
        self.draw_properties_updated = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.opacities.is_empty()
            && self.clips.is_empty()
            && self.content.is_empty()
            && self.effects.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl LayerStore {
    /// Evaluates the layer tree, recomputing draw properties and returning
    /// the set of changes.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer
    /// to avoid allocation.
    pub fn evaluate_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        changes.transforms = self.drain_propagating(dirty::TRANSFORM);
        changes.opacities = self.drain_propagating(dirty::OPACITY);
        changes.clips = self.drain_local(dirty::CLIP);
        changes.content = self.drain_local(dirty::CONTENT);
        changes.effects = self.drain_local(dirty::EFFECTS);
        // Topology is structural; the traversal order already reflects it.
        let _ = self.drain_local(dirty::TOPOLOGY);

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);

        if !changes.is_empty() {
            self.update_draw_properties(changes);
            changes.draw_properties_updated = true;
        }
    }

    /// Returns the current traversal order (depth-first pre-order).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called at least
    /// once.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn drain_propagating(&mut self, channel: Channel) -> Vec<u32> {
        self.dirty
            .drain(channel)
            .affected()
            .deterministic()
            .run()
            .collect()
    }

    fn drain_local(&mut self, channel: Channel) -> Vec<u32> {
        self.dirty.drain(channel).deterministic().run().collect()
    }

    /// Rebuilds the depth-first pre-order traversal of all live layers.
    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                self.dfs_collect(idx);
            }
        }
    }

    /// Depth-first pre-order collection starting from `idx`.
    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::geometry::{IntRect, IntSize};
    use crate::layer::{LayerEffects, LayerFlags, LayerId, Replica};
    use crate::transform::Transform3d;

    fn hidden() -> LayerFlags {
        LayerFlags {
            hidden: true,
            ..LayerFlags::default()
        }
    }

    fn forced_surface() -> LayerFlags {
        LayerFlags {
            force_render_surface: true,
            ..LayerFlags::default()
        }
    }

    fn layer(store: &mut LayerStore, parent: Option<LayerId>, size: i32) -> LayerId {
        let id = store.create_layer();
        store.set_bounds(id, IntSize::new(size, size));
        if let Some(p) = parent {
            store.add_child(p, id);
        }
        id
    }

    #[test]
    fn root_owns_surface_and_children_draw_into_it() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 100);
        let child = layer(&mut store, Some(root), 10);

        let root_xf = Transform3d::from_translation(10.0, 0.0, 0.0);
        let child_xf = Transform3d::from_translation(0.0, 5.0, 0.0);
        store.set_transform(root, root_xf);
        store.set_transform(child, child_xf);
        let _ = store.evaluate();

        let surface = store.render_surface(root).expect("root surface");
        assert_eq!(surface.screen_space_transform, root_xf);
        assert_eq!(store.render_target(root), root);
        assert_eq!(store.render_target(child), root);
        assert_eq!(store.draw_transform(root), Transform3d::IDENTITY);
        assert_eq!(store.draw_transform(child), child_xf);
        assert_eq!(store.screen_space_transform(child), root_xf * child_xf);
        assert!(store.render_surface(child).is_none());
    }

    #[test]
    fn group_opacity_creates_surface() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 100);
        let group = layer(&mut store, Some(root), 50);
        let child = layer(&mut store, Some(group), 10);
        store.set_opacity(group, 0.5);
        store.set_opacity(child, 0.8);
        let _ = store.evaluate();

        let surface = store.render_surface(group).expect("group surface");
        assert!((surface.draw_opacity - 0.5).abs() < 1e-6);
        assert_eq!(store.render_target(child), group);
        assert!((store.draw_opacity(child) - 0.8).abs() < 1e-6);
        assert!((store.draw_opacity(group) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn leaf_opacity_multiplies_without_surface() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 100);
        let mid = layer(&mut store, Some(root), 50);
        let leaf = layer(&mut store, Some(mid), 10);
        store.set_opacity(leaf, 0.5);
        let _ = store.evaluate();

        assert!(store.render_surface(leaf).is_none());
        assert!(store.render_surface(mid).is_none());
        assert!((store.draw_opacity(leaf) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn animating_opacity_is_unknown_downstream() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 100);
        let leaf = layer(&mut store, Some(root), 10);
        store.set_flags(
            leaf,
            LayerFlags {
                opacity_animating: true,
                ..LayerFlags::default()
            },
        );
        let _ = store.evaluate();
        assert!(store.draw_opacity_is_animating(leaf));
        assert!(!store.draw_transform_is_animating(leaf));
    }

    #[test]
    fn clip_restricts_visible_content_rect() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 200);
        let child = layer(&mut store, Some(root), 100);
        store.set_clip(root, Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
        store.set_transform(child, Transform3d::from_translation(10.0, 10.0, 0.0));
        let _ = store.evaluate();

        assert_eq!(store.clip_rect(child), Some(IntRect::new(0, 0, 50, 50)));
        assert_eq!(store.visible_content_rect(child), IntRect::new(0, 0, 40, 40));
        // The root's own content is not clipped by its clip.
        assert_eq!(store.clip_rect(root), None);
        assert_eq!(store.visible_content_rect(root), IntRect::new(0, 0, 200, 200));
    }

    #[test]
    fn nested_clips_intersect_in_target_space() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 200);
        let mid = layer(&mut store, Some(root), 200);
        let leaf = layer(&mut store, Some(mid), 200);
        store.set_clip(root, Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        store.set_transform(mid, Transform3d::from_translation(50.0, 50.0, 0.0));
        store.set_clip(mid, Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let _ = store.evaluate();

        assert_eq!(store.clip_rect(leaf), Some(IntRect::new(50, 50, 50, 50)));
        assert_eq!(store.visible_content_rect(leaf), IntRect::new(0, 0, 50, 50));
    }

    #[test]
    fn surface_clip_comes_from_ancestors() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 200);
        let surface_layer = layer(&mut store, Some(root), 100);
        store.set_clip(root, Some(Rect::new(0.0, 0.0, 60.0, 60.0)));
        store.set_flags(surface_layer, forced_surface());
        let _ = store.evaluate();

        let surface = store.render_surface(surface_layer).expect("surface");
        assert_eq!(surface.clip_rect, Some(IntRect::new(0, 0, 60, 60)));
        // The owning layer draws unclipped into its own surface.
        assert_eq!(store.clip_rect(surface_layer), None);
    }

    #[test]
    fn content_rects_accumulate_bottom_up() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 10);
        let surface_layer = layer(&mut store, Some(root), 0);
        let leaf = layer(&mut store, Some(surface_layer), 10);
        store.set_flags(surface_layer, forced_surface());
        store.set_transform(surface_layer, Transform3d::from_translation(20.0, 20.0, 0.0));
        store.set_transform(leaf, Transform3d::from_translation(5.0, 5.0, 0.0));
        let _ = store.evaluate();

        let surface = store.render_surface(surface_layer).expect("surface");
        assert_eq!(surface.content_rect, IntRect::new(5, 5, 10, 10));
        let root_surface = store.render_surface(root).expect("root surface");
        assert_eq!(root_surface.content_rect, IntRect::from_edges(0, 0, 35, 35));
    }

    #[test]
    fn replica_extends_target_content_rect() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 0);
        let reflected = layer(&mut store, Some(root), 10);
        store.set_effects(
            reflected,
            LayerEffects {
                replica: Some(Replica {
                    transform: Transform3d::from_translation(0.0, 30.0, 0.0),
                    has_mask: false,
                }),
                ..LayerEffects::default()
            },
        );
        let _ = store.evaluate();

        let surface = store.render_surface(reflected).expect("surface");
        assert_eq!(
            surface.replica_draw_transform,
            Some(Transform3d::from_translation(0.0, 30.0, 0.0))
        );
        let root_surface = store.render_surface(root).expect("root surface");
        assert_eq!(root_surface.content_rect, IntRect::from_edges(0, 0, 10, 40));
    }

    #[test]
    fn copy_request_marks_occlusion_immune_subtree() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 100);
        let copied = layer(&mut store, Some(root), 50);
        let nested = layer(&mut store, Some(copied), 20);
        store.set_effects(
            copied,
            LayerEffects {
                copy_request: true,
                ..LayerEffects::default()
            },
        );
        store.set_flags(nested, forced_surface());
        let _ = store.evaluate();

        let immune = |id| {
            store
                .render_surface(id)
                .expect("surface")
                .nearest_occlusion_immune_ancestor
        };
        assert_eq!(immune(root), None);
        assert_eq!(immune(copied), Some(copied));
        assert_eq!(immune(nested), Some(copied));
    }

    #[test]
    fn hidden_copy_request_draws_only_into_its_own_surface() {
        let mut store = LayerStore::new();
        let root = layer(&mut store, None, 0);
        let copied = layer(&mut store, Some(root), 0);
        let _leaf = layer(&mut store, Some(copied), 30);
        store.set_effects(
            copied,
            LayerEffects {
                copy_request: true,
                ..LayerEffects::default()
            },
        );
        store.set_flags(copied, hidden());
        let _ = store.evaluate();

        assert!(store.effective_hidden(copied));
        let surface = store.render_surface(copied).expect("surface");
        assert_eq!(surface.content_rect, IntRect::new(0, 0, 30, 30));
        let root_surface = store.render_surface(root).expect("root surface");
        assert!(root_surface.content_rect.is_empty());
    }

    #[test]
    fn no_change_evaluate_returns_empty() {
        let mut store = LayerStore::new();
        let _root = store.create_layer();

        let first = store.evaluate();
        assert!(first.draw_properties_updated);

        let changes = store.evaluate();
        assert!(changes.is_empty());
        assert!(changes.added.is_empty());
        assert!(!changes.topology_changed);
        assert!(!changes.draw_properties_updated);
    }

    #[test]
    fn traversal_order_is_depth_first() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        let d = store.create_layer();

        // Tree: a -> [b -> [d], c]
        store.add_child(a, b);
        store.add_child(a, c);
        store.add_child(b, d);

        let _ = store.evaluate();

        let order = store.traversal_order();
        assert_eq!(order, &[a.idx, b.idx, d.idx, c.idx]);
    }

    #[test]
    fn evaluate_multiple_roots() {
        let mut store = LayerStore::new();
        let root_a = store.create_layer();
        let child_a = store.create_layer();
        let root_b = store.create_layer();
        store.add_child(root_a, child_a);

        let a_xf = Transform3d::from_translation(1.0, 0.0, 0.0);
        let child_xf = Transform3d::from_translation(0.0, 2.0, 0.0);
        let b_xf = Transform3d::from_translation(3.0, 0.0, 0.0);
        store.set_transform(root_a, a_xf);
        store.set_transform(child_a, child_xf);
        store.set_transform(root_b, b_xf);

        let _ = store.evaluate();

        assert_eq!(store.screen_space_transform(root_a), a_xf);
        assert_eq!(store.screen_space_transform(child_a), a_xf * child_xf);
        assert_eq!(store.screen_space_transform(root_b), b_xf);
        assert!(store.render_surface(root_b).is_some());
    }

    #[test]
    fn evaluate_added_and_removed_lifecycle() {
        let mut store = LayerStore::new();
        let id = store.create_layer();

        let changes = store.evaluate();
        assert!(changes.added.contains(&id.idx));
        assert!(changes.removed.is_empty());

        let changes = store.evaluate();
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());

        store.destroy_layer(id);
        let changes = store.evaluate();
        assert!(changes.removed.contains(&id.idx));
        assert!(changes.added.is_empty());
    }

    #[test]
    fn hidden_propagates_to_children() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);
        let _ = store.evaluate();

        store.set_flags(parent, hidden());
        let changes = store.evaluate();

        assert!(store.effective_hidden(parent));
        assert!(store.effective_hidden(child));
        assert!(changes.hidden.contains(&parent.idx));
        assert!(changes.hidden.contains(&child.idx));
    }

    #[test]
    fn unhide_restores_visibility() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let _ = store.evaluate();

        store.set_flags(root, hidden());
        let _ = store.evaluate();
        assert!(store.effective_hidden(root));

        store.set_flags(root, LayerFlags::default());
        let changes = store.evaluate();

        assert!(!store.effective_hidden(root));
        assert!(changes.unhidden.contains(&root.idx));
        assert!(changes.hidden.is_empty());
    }

    #[test]
    fn hidden_layer_still_computes_transform() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        store.add_child(parent, child);

        let parent_xf = Transform3d::from_translation(10.0, 0.0, 0.0);
        let child_xf = Transform3d::from_translation(0.0, 5.0, 0.0);
        store.set_transform(parent, parent_xf);
        store.set_transform(child, child_xf);
        store.set_flags(parent, hidden());

        let _ = store.evaluate();

        assert_eq!(store.screen_space_transform(child), parent_xf * child_xf);
        assert!(store.effective_hidden(child));
    }

    #[test]
    fn remove_from_parent_makes_new_root_surface() {
        let mut store = LayerStore::new();
        let parent = store.create_layer();
        let child = store.create_layer();
        let grandchild = store.create_layer();
        store.add_child(parent, child);
        store.add_child(child, grandchild);

        store.set_transform(parent, Transform3d::from_translation(10.0, 0.0, 0.0));
        store.set_flags(parent, hidden());
        let _ = store.evaluate();
        assert_eq!(store.render_target(grandchild), parent);

        store.remove_from_parent(child);
        let changes = store.evaluate();

        assert!(changes.transforms.contains(&child.idx));
        assert!(changes.transforms.contains(&grandchild.idx));
        assert!(changes.unhidden.contains(&child.idx));
        assert!(changes.unhidden.contains(&grandchild.idx));
        assert_eq!(store.render_target(grandchild), child);
        assert_eq!(store.screen_space_transform(grandchild), Transform3d::IDENTITY);
    }

    #[test]
    fn reparent_recomputes_render_targets() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let plain = store.create_layer();
        let group = store.create_layer();
        let child = store.create_layer();
        let other = store.create_layer();
        store.add_child(root, plain);
        store.add_child(root, group);
        store.add_child(group, other);
        store.add_child(plain, child);
        store.set_opacity(group, 0.5);
        let _ = store.evaluate();
        assert_eq!(store.render_target(child), root);

        store.reparent(child, group);
        let changes = store.evaluate();
        assert!(changes.topology_changed);
        assert_eq!(store.render_target(child), group);
    }

    #[test]
    fn evaluate_into_reuses_buffer() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();

        let mut changes = FrameChanges::default();
        store.evaluate_into(&mut changes);
        assert_eq!(changes.added.len(), 2);

        store.set_opacity(a, 0.5);
        store.evaluate_into(&mut changes);

        assert!(changes.added.is_empty(), "added should be cleared");
        assert!(
            changes.opacities.contains(&a.idx),
            "opacity change should be present"
        );
        assert!(
            !changes.opacities.contains(&b.idx),
            "unchanged layer should not appear"
        );
    }
}
