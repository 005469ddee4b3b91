// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::Rect;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::effects::{BlendMode, FilterOperations};
use crate::geometry::{IntRect, IntSize};
use crate::region::SimpleEnclosedRegion;
use crate::transform::Transform3d;

use super::draw::DrawState;
use super::id::{INVALID, LayerId};
use super::surface::RenderSurface;
use super::traverse::Children;

/// Per-layer boolean flags.
///
/// Setting [`hidden`](Self::hidden) suppresses all visual contribution of the
/// layer and its entire subtree, unless a hidden layer carries a copy request,
/// in which case its subtree is still drawn into its own surface. Properties
/// can still be mutated while hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerFlags {
    /// Whether the layer (and its subtree) is hidden.
    pub hidden: bool,
    /// Forces the layer to own a render surface.
    pub force_render_surface: bool,
    /// The layer is sorted in 3-D with its siblings, so its draw order is not
    /// known up front.
    pub in_3d_rendering_context: bool,
    /// Opacity is driven by a running animation.
    pub opacity_animating: bool,
    /// Transform is driven by a running animation.
    pub transform_animating: bool,
}

/// A reflected copy of a layer's surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Replica {
    /// Placement of the copy, relative to the owning layer.
    pub transform: Transform3d,
    /// Whether the copy is drawn through a mask.
    pub has_mask: bool,
}

/// Compositing effects attached to a layer.
///
/// Any non-default effect gives the layer its own render surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerEffects {
    /// Blend mode used when drawing the layer's surface into its target.
    pub blend_mode: BlendMode,
    /// Filters applied to the layer's own rendering.
    pub filters: FilterOperations,
    /// Filters applied to what lies behind the layer.
    pub backdrop_filters: FilterOperations,
    /// Whether the surface is drawn through a mask.
    pub has_mask: bool,
    /// Reflected copy of the surface, if any.
    pub replica: Option<Replica>,
    /// A readback of the surface was requested.
    pub copy_request: bool,
}

impl LayerEffects {
    /// Returns `true` if any effect needs an offscreen pass.
    #[must_use]
    pub fn needs_render_surface(&self) -> bool {
        !self.blend_mode.is_normal()
            || !self.filters.is_empty()
            || !self.backdrop_filters.is_empty()
            || self.has_mask
            || self.replica.is_some()
            || self.copy_request
    }
}

/// Struct-of-arrays storage for all layers.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer occupies
/// a slot in parallel arrays. Destroyed layers are recycled via a free list,
/// and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct LayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) local_transform: Vec<Transform3d>,
    pub(crate) local_opacity: Vec<f32>,
    pub(crate) clip: Vec<Option<Rect>>,
    pub(crate) bounds: Vec<IntSize>,
    pub(crate) contents_opaque: Vec<bool>,
    pub(crate) opaque_rect: Vec<Option<IntRect>>,
    pub(crate) flags: Vec<LayerFlags>,
    pub(crate) effects: Vec<LayerEffects>,

    // -- Computed properties (written by evaluate) --
    pub(crate) draw: Vec<DrawState>,
    pub(crate) surface: Vec<Option<RenderSurface>>,
    pub(crate) effective_hidden: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStore {
    /// Creates an empty layer store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            local_transform: Vec::new(),
            local_opacity: Vec::new(),
            clip: Vec::new(),
            bounds: Vec::new(),
            contents_opaque: Vec::new(),
            opaque_rect: Vec::new(),
            flags: Vec::new(),
            effects: Vec::new(),
            draw: Vec::new(),
            surface: Vec::new(),
            effective_hidden: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new layer and returns its handle.
    ///
    /// The layer starts with an identity transform, full opacity, empty
    /// bounds, no clip, no effects, and no parent.
    pub fn create_layer(&mut self) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.local_transform[i] = Transform3d::IDENTITY;
            self.local_opacity[i] = 1.0;
            self.clip[i] = None;
            self.bounds[i] = IntSize::ZERO;
            self.contents_opaque[i] = false;
            self.opaque_rect[i] = None;
            self.flags[i] = LayerFlags::default();
            self.effects[i] = LayerEffects::default();
            self.draw[i] = DrawState::INITIAL;
            self.surface[i] = None;
            self.effective_hidden[i] = false;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.local_transform.push(Transform3d::IDENTITY);
            self.local_opacity.push(1.0);
            self.clip.push(None);
            self.bounds.push(IntSize::ZERO);
            self.contents_opaque.push(false);
            self.opaque_rect.push(None);
            self.flags.push(LayerFlags::default());
            self.effects.push(LayerEffects::default());
            self.draw.push(DrawState::INITIAL);
            self.surface.push(None);
            self.effective_hidden.push(false);
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        self.id_at(idx)
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.surface[idx as usize] = None;

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// Marks inherited channels for `child`'s subtree so its draw properties
    /// are recomputed under the new ancestry.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Add dirty dependency edges: child depends on parent for TRANSFORM and OPACITY.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its current parent.
    ///
    /// Marks inherited channels for `child`'s subtree so its draw properties
    /// are recomputed after detaching from the old ancestry. The detached
    /// layer becomes a root with its own render surface.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove_from_parent(&mut self, child: LayerId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "layer has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        // Remove dirty dependency edges.
        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` to be a child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    /// Marks inherited channels for `child`'s subtree so its draw properties
    /// are recomputed under the new ancestry.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, child: LayerId, new_parent: LayerId) {
        self.validate(child);
        self.validate(new_parent);

        if self.parent[child.idx as usize] != INVALID {
            let old_p = self.parent[child.idx as usize];
            self.unlink_from_parent(child.idx);
            self.dirty
                .remove_dependency(child.idx, old_p, dirty::TRANSFORM);
            self.dirty
                .remove_dependency(child.idx, old_p, dirty::OPACITY);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }

        // Now add as child of new parent (inline the logic to avoid double-validate).
        let p = new_parent.idx;
        let c = child.idx;
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: LayerId, sibling: LayerId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(LayerId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the root layers (those with no parent).
    ///
    /// Roots are layers whose parent is [`INVALID`] and that are not in the
    /// free list.
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                roots.push(self.id_at(idx));
            }
        }
        roots
    }

    /// Returns `true` if the layer has no parent.
    #[must_use]
    pub fn is_root(&self, id: LayerId) -> bool {
        self.validate(id);
        self.parent[id.idx as usize] == INVALID
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local transform of a layer.
    #[must_use]
    pub fn local_transform(&self, id: LayerId) -> Transform3d {
        self.validate(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the local opacity of a layer.
    #[must_use]
    pub fn local_opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.local_opacity[id.idx as usize]
    }

    /// Returns the clip rect of a layer, in its local space.
    #[must_use]
    pub fn clip(&self, id: LayerId) -> Option<Rect> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    /// Returns the content bounds of a layer.
    #[must_use]
    pub fn bounds(&self, id: LayerId) -> IntSize {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns whether the layer's content fully covers its bounds.
    #[must_use]
    pub fn contents_opaque(&self, id: LayerId) -> bool {
        self.validate(id);
        self.contents_opaque[id.idx as usize]
    }

    /// Returns the declared opaque part of a partially transparent layer.
    #[must_use]
    pub fn opaque_rect(&self, id: LayerId) -> Option<IntRect> {
        self.validate(id);
        self.opaque_rect[id.idx as usize]
    }

    /// Returns the flags of a layer.
    #[must_use]
    pub fn flags(&self, id: LayerId) -> LayerFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the effects of a layer.
    #[must_use]
    pub fn effects(&self, id: LayerId) -> &LayerEffects {
        self.validate(id);
        &self.effects[id.idx as usize]
    }

    // -- Draw property getters (valid after evaluate) --

    /// Returns the layer that owns the render surface this layer draws into.
    ///
    /// A layer that owns a surface is its own render target.
    #[must_use]
    pub fn render_target(&self, id: LayerId) -> LayerId {
        self.validate(id);
        self.id_at(self.draw[id.idx as usize].render_target)
    }

    /// Returns the transform from the layer's space to its render target.
    #[must_use]
    pub fn draw_transform(&self, id: LayerId) -> Transform3d {
        self.validate(id);
        self.draw[id.idx as usize].draw_transform
    }

    /// Returns the transform from the layer's space to the screen.
    #[must_use]
    pub fn screen_space_transform(&self, id: LayerId) -> Transform3d {
        self.validate(id);
        self.draw[id.idx as usize].screen_space_transform
    }

    /// Returns the opacity the layer is drawn with inside its render target.
    #[must_use]
    pub fn draw_opacity(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.draw[id.idx as usize].draw_opacity
    }

    /// Returns whether the draw opacity may change under animation.
    #[must_use]
    pub fn draw_opacity_is_animating(&self, id: LayerId) -> bool {
        self.validate(id);
        self.draw[id.idx as usize].draw_opacity_animating
    }

    /// Returns whether the draw transform may change under animation.
    #[must_use]
    pub fn draw_transform_is_animating(&self, id: LayerId) -> bool {
        self.validate(id);
        self.draw[id.idx as usize].draw_transform_animating
    }

    /// Returns whether the screen-space transform may change under animation.
    #[must_use]
    pub fn screen_space_transform_is_animating(&self, id: LayerId) -> bool {
        self.validate(id);
        self.draw[id.idx as usize].screen_space_transform_animating
    }

    /// Returns the clip rect in render-target space, if the layer is clipped.
    #[must_use]
    pub fn clip_rect(&self, id: LayerId) -> Option<IntRect> {
        self.validate(id);
        self.draw[id.idx as usize].clip_rect
    }

    /// Returns the part of the layer's bounds that survives clipping, in the
    /// layer's space.
    #[must_use]
    pub fn visible_content_rect(&self, id: LayerId) -> IntRect {
        self.validate(id);
        self.draw[id.idx as usize].visible_content_rect
    }

    /// Returns the visible part of the layer known to be opaque, in the
    /// layer's space.
    #[must_use]
    pub fn visible_content_opaque_region(&self, id: LayerId) -> SimpleEnclosedRegion {
        self.validate(id);
        let i = id.idx as usize;
        let visible = self.draw[i].visible_content_rect;
        if self.contents_opaque[i] {
            return SimpleEnclosedRegion::from(visible);
        }
        self.opaque_rect[i].map_or_else(SimpleEnclosedRegion::new, |r| {
            SimpleEnclosedRegion::from(r.intersect(visible))
        })
    }

    /// Returns the render surface the layer owns, if any.
    #[must_use]
    pub fn render_surface(&self, id: LayerId) -> Option<&RenderSurface> {
        self.validate(id);
        self.surface[id.idx as usize].as_ref()
    }

    /// Returns whether the layer is effectively hidden (including by an
    /// ancestor's hidden flag).
    #[must_use]
    pub fn effective_hidden(&self, id: LayerId) -> bool {
        self.validate(id);
        self.effective_hidden[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local transform of a layer.
    ///
    /// Marks the TRANSFORM channel dirty with eager propagation to descendants.
    pub fn set_transform(&mut self, id: LayerId, transform: Transform3d) {
        self.validate(id);
        self.local_transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the local opacity of a layer.
    ///
    /// Marks the OPACITY channel dirty with eager propagation to descendants.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) {
        self.validate(id);
        self.local_opacity[id.idx as usize] = opacity;
        self.dirty.mark_with(id.idx, dirty::OPACITY, &EagerPolicy);
    }

    /// Sets the clip rect of a layer, in its local space.
    ///
    /// The clip applies to the layer's descendants.
    pub fn set_clip(&mut self, id: LayerId, clip: Option<Rect>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
        self.dirty.mark(id.idx, dirty::CLIP);
    }

    /// Sets the content bounds of a layer.
    pub fn set_bounds(&mut self, id: LayerId, bounds: IntSize) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Declares whether the layer's content fully covers its bounds.
    pub fn set_contents_opaque(&mut self, id: LayerId, opaque: bool) {
        self.validate(id);
        self.contents_opaque[id.idx as usize] = opaque;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Declares an opaque part of an otherwise transparent layer.
    pub fn set_opaque_rect(&mut self, id: LayerId, rect: Option<IntRect>) {
        self.validate(id);
        self.opaque_rect[id.idx as usize] = rect;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Sets the flags of a layer.
    pub fn set_flags(&mut self, id: LayerId, flags: LayerFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        // Hidden and animating state are inherited like transforms.
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the compositing effects of a layer.
    pub fn set_effects(&mut self, id: LayerId, effects: LayerEffects) {
        self.validate(id);
        self.effects[id.idx as usize] = effects;
        self.dirty.mark(id.idx, dirty::EFFECTS);
    }

    // -- Internal helpers --

    /// Builds a handle for a live slot.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
    }
}
