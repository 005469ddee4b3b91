// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening of embedded surfaces into one frame.
//!
//! The root frame's passes are copied in order. Whenever a pass contains a
//! [`Material::Surface`] quad, the referenced surface's current frame is
//! spliced in at that quad's position:
//!
//! - the embedded root pass's quads replace the surface quad, with their
//!   shared states composed with the surface quad's transform, clip and
//!   opacity;
//! - the embedded frame's other passes are emitted, under fresh ids, before
//!   the pass being built, since they are drawn before it.
//!
//! Root pass ids are kept. Every pass id an embedded frame refers to is
//! renamed per embedding, to an id no other pass in the output uses. A
//! render-pass quad naming a pass its own frame does not define, its own root
//! pass included, is dropped.
//!
//! The set of surfaces currently being spliced lives in per-call state, so a
//! reference back into that set is dropped instead of recursing.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use stratum_core::geometry::IntRect;
use stratum_core::surface_id::SurfaceId;
use stratum_core::trace::{AggregateEvent, SkipReason, SurfaceEmbedEvent, SurfaceSkipEvent, Tracer};
use stratum_core::transform::Transform3d;
use stratum_render::{DrawQuad, Frame, Material, RenderPass, RenderPassId, SharedQuadState};

use crate::manager::SurfaceManager;

/// Aggregation limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Deepest embedding that is still spliced. The root's direct references
    /// are depth 1.
    pub max_embed_depth: usize,
}

impl AggregatorConfig {
    /// Default for [`max_embed_depth`](Self::max_embed_depth).
    pub const DEFAULT_MAX_EMBED_DEPTH: usize = 64;

    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_embed_depth: Self::DEFAULT_MAX_EMBED_DEPTH,
        }
    }

    /// Sets [`max_embed_depth`](Self::max_embed_depth).
    #[must_use]
    pub const fn with_max_embed_depth(mut self, max_embed_depth: usize) -> Self {
        self.max_embed_depth = max_embed_depth;
        self
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How content of one frame lands in the pass being built.
#[derive(Debug)]
struct Embedding {
    transform: Transform3d,
    clip: Option<IntRect>,
    opacity: f32,
    /// Pass ids of the embedded frame, renamed. `None` keeps ids as they are.
    remap: Option<HashMap<RenderPassId, RenderPassId>>,
}

impl Embedding {
    fn identity() -> Self {
        Self {
            transform: Transform3d::IDENTITY,
            clip: None,
            opacity: 1.0,
            remap: None,
        }
    }

    fn apply(&self, sqs: &SharedQuadState) -> SharedQuadState {
        let mut out = *sqs;
        out.content_to_target_transform = self.transform * sqs.content_to_target_transform;
        out.opacity = sqs.opacity * self.opacity;
        if sqs.is_clipped {
            out.clip_rect = self.transform.map_enclosing_clipped_rect(sqs.clip_rect);
        }
        if let Some(clip) = self.clip {
            out.clip_rect = if out.is_clipped {
                out.clip_rect.intersect(clip)
            } else {
                clip
            };
            out.is_clipped = true;
        }
        out
    }

    /// Renames a render-pass reference. Returns `None` if the embedded frame
    /// does not define the pass.
    fn remap_material(&self, material: Material) -> Option<Material> {
        match (material, &self.remap) {
            (Material::RenderPass { pass_id }, Some(remap)) => remap
                .get(&pass_id)
                .map(|&pass_id| Material::RenderPass { pass_id }),
            (other, _) => Some(other),
        }
    }
}

/// Per-call state.
#[derive(Debug)]
struct AggregateState {
    dest_passes: Vec<RenderPass>,
    /// Surfaces on the active splice chain.
    referenced: HashSet<SurfaceId>,
    /// Every pass id handed out so far, root ids included.
    used_pass_ids: HashSet<RenderPassId>,
    next_pass_id: u32,
    embedded_surfaces: usize,
}

impl AggregateState {
    /// Returns the next id not taken by any pass, wrapping past `u32::MAX`.
    fn allocate_pass_id(&mut self) -> RenderPassId {
        loop {
            let id = RenderPassId(self.next_pass_id);
            self.next_pass_id = self.next_pass_id.wrapping_add(1);
            if self.used_pass_ids.insert(id) {
                return id;
            }
        }
    }
}

/// Produces one flat frame from a root surface and everything it embeds.
///
/// Borrows the registry for its whole lifetime, so surfaces cannot be
/// registered or removed while an aggregator exists.
#[derive(Debug)]
pub struct SurfaceAggregator<'a> {
    manager: &'a SurfaceManager,
    config: AggregatorConfig,
    tracer: Tracer<'a>,
}

impl<'a> SurfaceAggregator<'a> {
    /// Creates an aggregator with the default configuration and no tracing.
    #[must_use]
    pub fn new(manager: &'a SurfaceManager) -> Self {
        Self {
            manager,
            config: AggregatorConfig::new(),
            tracer: Tracer::none(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Routes events to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer<'a>) -> Self {
        self.tracer = tracer;
        self
    }

    /// The active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> AggregatorConfig {
        self.config
    }

    /// Flattens `root` and every surface it transitively embeds.
    ///
    /// Returns an empty frame if `root` is unknown or has no frame.
    pub fn aggregate(&mut self, root: SurfaceId) -> Frame {
        let manager = self.manager;
        let Some(surface) = manager.lookup(root) else {
            self.skip(root, 0, SkipReason::Missing);
            return Frame::default();
        };
        let Some(frame) = surface.current_frame().filter(|f| !f.is_empty()) else {
            self.skip(root, 0, SkipReason::NoFrame);
            return Frame::new(surface.size());
        };

        let used_pass_ids: HashSet<_> = frame.render_passes.iter().map(|p| p.id).collect();
        let max_id = used_pass_ids.iter().map(|id| id.0).max().unwrap_or(0);
        let mut state = AggregateState {
            dest_passes: Vec::with_capacity(frame.render_passes.len()),
            referenced: HashSet::new(),
            used_pass_ids,
            next_pass_id: max_id.wrapping_add(1),
            embedded_surfaces: 0,
        };
        state.referenced.insert(root);

        let embedding = Embedding::identity();
        for pass in &frame.render_passes {
            let mut dest = pass.copy_without_quads(pass.id);
            self.copy_quads(&mut state, &mut dest, pass, &embedding, 0);
            state.dest_passes.push(dest);
        }

        let out = Frame {
            size: frame.size,
            render_passes: state.dest_passes,
        };
        self.tracer.aggregate(&AggregateEvent {
            root,
            render_passes: out.render_passes.len(),
            quads: out.quad_count(),
            embedded_surfaces: state.embedded_surfaces,
        });
        out
    }

    /// Appends `source`'s quads to `dest`, placed by `embedding`.
    fn copy_quads(
        &mut self,
        state: &mut AggregateState,
        dest: &mut RenderPass,
        source: &RenderPass,
        embedding: &Embedding,
        depth: usize,
    ) {
        // (source index, dest index) of the shared state the previous quad used.
        let mut last_sqs: Option<(usize, usize)> = None;
        for quad in &source.quads {
            let sqs = source.shared_quad_state_for(quad);
            if let Some(surface_id) = quad.surface_id() {
                let placed = embedding.apply(sqs);
                if self.splice_surface(state, dest, surface_id, &placed, depth + 1) {
                    last_sqs = None;
                }
                continue;
            }
            let Some(material) = embedding.remap_material(quad.material) else {
                continue;
            };
            let dest_sqs = match last_sqs {
                Some((src, dst)) if src == quad.shared_quad_state => dst,
                _ => {
                    let dst = dest.push_shared_quad_state(embedding.apply(sqs));
                    last_sqs = Some((quad.shared_quad_state, dst));
                    dst
                }
            };
            dest.push_quad(DrawQuad {
                material,
                shared_quad_state: dest_sqs,
                ..*quad
            });
        }
    }

    /// Splices `surface_id`'s frame into `dest`. Returns `true` if anything
    /// was spliced.
    fn splice_surface(
        &mut self,
        state: &mut AggregateState,
        dest: &mut RenderPass,
        surface_id: SurfaceId,
        placed: &SharedQuadState,
        depth: usize,
    ) -> bool {
        if depth > self.config.max_embed_depth {
            self.skip(surface_id, depth, SkipReason::DepthLimit);
            return false;
        }
        if state.referenced.contains(&surface_id) {
            self.skip(surface_id, depth, SkipReason::Cycle);
            return false;
        }
        let manager = self.manager;
        let Some(surface) = manager.lookup(surface_id) else {
            self.skip(surface_id, depth, SkipReason::Missing);
            return false;
        };
        let Some((child_root, child_passes)) = surface
            .current_frame()
            .and_then(|f| f.render_passes.split_last())
        else {
            self.skip(surface_id, depth, SkipReason::NoFrame);
            return false;
        };

        state.referenced.insert(surface_id);
        state.embedded_surfaces += 1;
        self.tracer.surface_embed(&SurfaceEmbedEvent {
            surface: surface_id,
            depth,
        });

        let ids: Vec<_> = child_passes
            .iter()
            .map(|_| state.allocate_pass_id())
            .collect();
        let remap: HashMap<_, _> = child_passes
            .iter()
            .map(|p| p.id)
            .zip(ids.iter().copied())
            .collect();
        let child = Embedding {
            transform: placed.content_to_target_transform,
            clip: placed.clip(),
            opacity: placed.opacity,
            remap: Some(remap),
        };

        // Intermediate passes keep their own space; only where they end up
        // relative to the root target changes.
        let to_root = dest.transform_to_root_target * child.transform;
        let intermediate = Embedding {
            remap: child.remap.clone(),
            ..Embedding::identity()
        };
        for (pass, &id) in child_passes.iter().zip(&ids) {
            let mut copy = pass.copy_without_quads(id);
            copy.transform_to_root_target = to_root * pass.transform_to_root_target;
            self.copy_quads(state, &mut copy, pass, &intermediate, depth);
            state.dest_passes.push(copy);
        }

        self.copy_quads(state, dest, child_root, &child, depth);

        state.referenced.remove(&surface_id);
        true
    }

    fn skip(&mut self, surface: SurfaceId, depth: usize, reason: SkipReason) {
        self.tracer.surface_skip(&SurfaceSkipEvent {
            surface,
            depth,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use stratum_core::geometry::IntSize;
    use stratum_render::Color;

    use super::*;

    const VIEWPORT: IntSize = IntSize::new(200, 200);

    /// Test quad: each gets its own shared state.
    enum Q {
        Solid(IntRect, Color),
        Embed(IntRect, SurfaceId, SharedQuadState),
    }

    fn pass(id: u32, size: IntSize, quads: &[Q]) -> RenderPass {
        let mut pass = RenderPass::new(RenderPassId(id), IntRect::from_size(size));
        for q in quads {
            match *q {
                Q::Solid(rect, color) => {
                    let s = pass.push_shared_quad_state(SharedQuadState::new(
                        Transform3d::IDENTITY,
                        size,
                    ));
                    pass.push_quad(DrawQuad::solid_color(s, rect, color));
                }
                Q::Embed(rect, id, sqs) => {
                    let s = pass.push_shared_quad_state(sqs);
                    pass.push_quad(DrawQuad::surface(s, rect, id));
                }
            }
        }
        pass
    }

    fn embed(id: SurfaceId, size: IntSize) -> Q {
        Q::Embed(
            IntRect::from_size(size),
            id,
            SharedQuadState::new(Transform3d::IDENTITY, size),
        )
    }

    fn submit(manager: &mut SurfaceManager, id: SurfaceId, size: IntSize, passes: Vec<RenderPass>) {
        manager
            .queue_frame(
                id,
                Frame {
                    size,
                    render_passes: passes,
                },
            )
            .expect("frame size matches surface");
    }

    /// Color of the frontmost quad covering `(x, y)` in the root pass.
    fn color_at(frame: &Frame, x: i32, y: i32) -> Option<Color> {
        let root = frame.root_pass()?;
        root.quads.iter().find_map(|quad| {
            let sqs = root.shared_quad_state_for(quad);
            let mut rect = sqs.content_to_target_transform.map_enclosing_clipped_rect(quad.rect);
            if let Some(clip) = sqs.clip() {
                rect = rect.intersect(clip);
            }
            match quad.material {
                Material::SolidColor { color, .. } if rect.contains_point(x, y) => Some(color),
                _ => None,
            }
        })
    }

    /// A square intermediate pass filled with `color`.
    fn intermediate(id: u32, side: i32, color: Color) -> RenderPass {
        let size = IntSize::new(side, side);
        pass(id, size, &[Q::Solid(IntRect::from_size(size), color)])
    }

    /// A viewport-sized pass drawing each of `inputs`, then `extra`.
    fn consuming(id: u32, inputs: &[u32]) -> RenderPass {
        let mut pass = RenderPass::new(RenderPassId(id), IntRect::from_size(VIEWPORT));
        let s = pass.push_shared_quad_state(SharedQuadState::new(Transform3d::IDENTITY, VIEWPORT));
        for &input in inputs {
            pass.push_quad(DrawQuad::render_pass(
                s,
                IntRect::new(0, 0, 10, 10),
                RenderPassId(input),
            ));
        }
        pass
    }

    fn consumed_passes(pass: &RenderPass) -> Vec<RenderPassId> {
        pass.quads
            .iter()
            .filter_map(|q| match q.material {
                Material::RenderPass { pass_id } => Some(pass_id),
                _ => None,
            })
            .collect()
    }

    fn solid_colors(pass: &RenderPass) -> Vec<Color> {
        pass.quads
            .iter()
            .filter_map(|q| match q.material {
                Material::SolidColor { color, .. } => Some(color),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_surface_single_quad() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![pass(1, VIEWPORT, &[Q::Solid(IntRect::from_size(VIEWPORT), Color::GREEN)])],
        );

        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        assert_eq!(frame.render_passes.len(), 1);
        let pass = &frame.render_passes[0];
        assert_eq!(pass.quads.len(), 1);
        assert_eq!(pass.quads[0].rect, IntRect::new(0, 0, 200, 200));
        assert_eq!(solid_colors(pass), vec![Color::GREEN]);
    }

    #[test]
    fn embedded_surface_draws_over_parent_content() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let child_size = IntSize::new(200, 100);
        let child = manager.create_surface(child_size);
        submit(
            &mut manager,
            child,
            child_size,
            vec![pass(1, child_size, &[Q::Solid(IntRect::from_size(child_size), Color::BLUE)])],
        );
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![pass(
                1,
                VIEWPORT,
                &[
                    embed(child, child_size),
                    Q::Solid(IntRect::from_size(VIEWPORT), Color::YELLOW),
                ],
            )],
        );

        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        assert_eq!(frame.render_passes.len(), 1);
        assert_eq!(
            solid_colors(&frame.render_passes[0]),
            vec![Color::BLUE, Color::YELLOW]
        );
        assert_eq!(color_at(&frame, 10, 10), Some(Color::BLUE));
        assert_eq!(color_at(&frame, 199, 99), Some(Color::BLUE));
        assert_eq!(color_at(&frame, 10, 100), Some(Color::YELLOW));
        assert_eq!(color_at(&frame, 150, 199), Some(Color::YELLOW));
    }

    #[test]
    fn embed_transform_composes_with_child_transform() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let child_size = IntSize::new(100, 100);
        let child = manager.create_surface(child_size);
        submit(
            &mut manager,
            child,
            child_size,
            vec![pass(1, child_size, &[Q::Solid(IntRect::from_size(child_size), Color::RED)])],
        );
        let placed =
            SharedQuadState::new(Transform3d::from_translation(100.0, 0.0, 0.0), child_size);
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![pass(
                1,
                VIEWPORT,
                &[Q::Embed(IntRect::from_size(child_size), child, placed)],
            )],
        );

        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        let pass = &frame.render_passes[0];
        assert_eq!(pass.quads.len(), 1);
        let sqs = pass.shared_quad_state_for(&pass.quads[0]);
        assert_eq!(
            sqs.content_to_target_transform
                .map_enclosing_clipped_rect(pass.quads[0].rect),
            IntRect::new(100, 0, 100, 100)
        );
    }

    #[test]
    fn missing_surface_matches_frame_without_the_quad() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let frameless = manager.create_surface(VIEWPORT);
        let red = Q::Solid(IntRect::new(0, 0, 10, 10), Color::RED);
        let green = Q::Solid(IntRect::new(0, 0, 50, 50), Color::GREEN);
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![pass(
                1,
                VIEWPORT,
                &[
                    Q::Solid(IntRect::new(0, 0, 10, 10), Color::RED),
                    embed(SurfaceId(0xDEAD), VIEWPORT),
                    embed(frameless, VIEWPORT),
                    Q::Solid(IntRect::new(0, 0, 50, 50), Color::GREEN),
                ],
            )],
        );
        let with_refs = SurfaceAggregator::new(&manager).aggregate(root);

        let mut plain = SurfaceManager::new();
        let plain_root = plain.create_surface(VIEWPORT);
        submit(&mut plain, plain_root, VIEWPORT, vec![pass(1, VIEWPORT, &[red, green])]);
        let without_refs = SurfaceAggregator::new(&plain).aggregate(plain_root);

        assert_eq!(with_refs, without_refs);
    }

    #[test]
    fn cycles_are_cut() {
        let mut manager = SurfaceManager::new();
        let a = manager.create_surface(VIEWPORT);
        let b = manager.create_surface(VIEWPORT);
        submit(
            &mut manager,
            a,
            VIEWPORT,
            vec![pass(
                1,
                VIEWPORT,
                &[embed(b, VIEWPORT), Q::Solid(IntRect::new(0, 0, 5, 5), Color::RED)],
            )],
        );
        submit(
            &mut manager,
            b,
            VIEWPORT,
            vec![pass(
                1,
                VIEWPORT,
                &[
                    embed(a, VIEWPORT),
                    embed(b, VIEWPORT),
                    Q::Solid(IntRect::new(0, 0, 5, 5), Color::BLUE),
                ],
            )],
        );

        let frame = SurfaceAggregator::new(&manager).aggregate(a);
        assert_eq!(frame.render_passes.len(), 1);
        assert_eq!(
            solid_colors(&frame.render_passes[0]),
            vec![Color::BLUE, Color::RED]
        );
    }

    const CHAIN_COLORS: [Color; 4] = [Color::RED, Color::GREEN, Color::BLUE, Color::YELLOW];

    #[test]
    fn depth_limit_stops_deep_chains() {
        let mut manager = SurfaceManager::new();
        let ids: Vec<_> = (0..4).map(|_| manager.create_surface(VIEWPORT)).collect();
        for (i, &id) in ids.iter().enumerate() {
            let mut quads = Vec::new();
            if let Some(&next) = ids.get(i + 1) {
                quads.push(embed(next, VIEWPORT));
            }
            quads.push(Q::Solid(IntRect::new(0, 0, 1, 1), CHAIN_COLORS[i]));
            submit(&mut manager, id, VIEWPORT, vec![pass(1, VIEWPORT, &quads)]);
        }

        let unlimited = SurfaceAggregator::new(&manager).aggregate(ids[0]);
        assert_eq!(unlimited.quad_count(), 4);

        let limited = SurfaceAggregator::new(&manager)
            .with_config(AggregatorConfig::new().with_max_embed_depth(2))
            .aggregate(ids[0]);
        assert_eq!(
            solid_colors(&limited.render_passes[0]),
            vec![CHAIN_COLORS[2], CHAIN_COLORS[1], CHAIN_COLORS[0]]
        );
    }

    #[test]
    fn embed_clip_and_opacity_apply_to_child_states() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let child = manager.create_surface(VIEWPORT);

        let mut child_pass = RenderPass::new(RenderPassId(1), IntRect::from_size(VIEWPORT));
        let s = child_pass.push_shared_quad_state(
            SharedQuadState::new(Transform3d::IDENTITY, VIEWPORT)
                .with_clip(IntRect::new(10, 10, 100, 100))
                .with_opacity(0.5),
        );
        child_pass.push_quad(DrawQuad::solid_color(s, IntRect::from_size(VIEWPORT), Color::RED));
        submit(&mut manager, child, VIEWPORT, vec![child_pass]);

        let placed = SharedQuadState::new(Transform3d::from_translation(5.0, 0.0, 0.0), VIEWPORT)
            .with_clip(IntRect::new(0, 0, 50, 50))
            .with_opacity(0.5);
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![pass(1, VIEWPORT, &[Q::Embed(IntRect::from_size(VIEWPORT), child, placed)])],
        );

        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        let pass = &frame.render_passes[0];
        let sqs = pass.shared_quad_state_for(&pass.quads[0]);
        // Child clip (10,10 100x100) moves to (15,10) and meets the embed clip.
        assert_eq!(sqs.clip(), Some(IntRect::new(15, 10, 35, 40)));
        assert_eq!(sqs.opacity, 0.25);
    }

    #[test]
    fn unclipped_child_inherits_embed_clip() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let child = manager.create_surface(VIEWPORT);
        submit(
            &mut manager,
            child,
            VIEWPORT,
            vec![pass(1, VIEWPORT, &[Q::Solid(IntRect::from_size(VIEWPORT), Color::RED)])],
        );
        let placed = SharedQuadState::new(Transform3d::IDENTITY, VIEWPORT)
            .with_clip(IntRect::new(0, 0, 20, 30));
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![pass(1, VIEWPORT, &[Q::Embed(IntRect::from_size(VIEWPORT), child, placed)])],
        );

        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        let pass = &frame.render_passes[0];
        assert_eq!(
            pass.shared_quad_state_for(&pass.quads[0]).clip(),
            Some(IntRect::new(0, 0, 20, 30))
        );
        assert_eq!(color_at(&frame, 19, 29), Some(Color::RED));
        assert_eq!(color_at(&frame, 20, 29), None);
    }

    #[test]
    fn intermediate_passes_are_renamed_and_emitted_first() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let child = manager.create_surface(VIEWPORT);

        // Child: pass 1 is an intermediate target consumed by root pass 2.
        let mut child_intermediate = intermediate(1, 10, Color::RED);
        child_intermediate.transform_to_root_target = Transform3d::from_translation(1.0, 0.0, 0.0);
        let child_root = consuming(2, &[1]);
        submit(&mut manager, child, VIEWPORT, vec![child_intermediate, child_root]);

        // Root: also has a pass 1, and embeds the child twice.
        let root_intermediate = intermediate(1, 5, Color::GREEN);
        let placed = SharedQuadState::new(Transform3d::from_translation(0.0, 50.0, 0.0), VIEWPORT);
        let root_pass = pass(
            2,
            VIEWPORT,
            &[
                embed(child, VIEWPORT),
                Q::Embed(IntRect::from_size(VIEWPORT), child, placed),
            ],
        );
        submit(&mut manager, root, VIEWPORT, vec![root_intermediate, root_pass]);

        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        let ids: Vec<_> = frame.render_passes.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![RenderPassId(1), RenderPassId(3), RenderPassId(4), RenderPassId(2)]
        );

        let root_pass = frame.root_pass().expect("root pass");
        assert_eq!(
            consumed_passes(root_pass),
            vec![RenderPassId(3), RenderPassId(4)]
        );

        let second = frame.pass(RenderPassId(4)).expect("second copy");
        assert_eq!(
            second.transform_to_root_target,
            Transform3d::from_translation(1.0, 50.0, 0.0)
        );
        assert_eq!(solid_colors(second), vec![Color::RED]);
    }

    #[test]
    fn embedded_references_to_undefined_passes_are_dropped() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let child = manager.create_surface(VIEWPORT);

        // The child's only pass reads pass 1, which it never defines, and
        // its own root pass.
        let mut child_root = consuming(2, &[1, 2]);
        let s = child_root
            .push_shared_quad_state(SharedQuadState::new(Transform3d::IDENTITY, VIEWPORT));
        child_root.push_quad(DrawQuad::solid_color(s, IntRect::new(0, 0, 5, 5), Color::BLUE));
        submit(&mut manager, child, VIEWPORT, vec![child_root]);

        // The root's private pass 1 must not leak into the child.
        let root_pass = pass(2, VIEWPORT, &[embed(child, VIEWPORT)]);
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![intermediate(1, 5, Color::RED), root_pass],
        );

        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        let ids: Vec<_> = frame.render_passes.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![RenderPassId(1), RenderPassId(2)]);
        let root_pass = frame.root_pass().expect("root pass");
        assert_eq!(consumed_passes(root_pass), Vec::new());
        assert_eq!(solid_colors(root_pass), vec![Color::BLUE]);
    }

    #[test]
    fn fresh_pass_ids_skip_ids_already_in_use() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let child = manager.create_surface(VIEWPORT);
        submit(
            &mut manager,
            child,
            VIEWPORT,
            vec![intermediate(5, 10, Color::RED), consuming(6, &[5])],
        );

        let root_pass = pass(u32::MAX, VIEWPORT, &[embed(child, VIEWPORT)]);
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![intermediate(0, 5, Color::GREEN), root_pass],
        );

        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        let ids: Vec<_> = frame.render_passes.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![RenderPassId(0), RenderPassId(1), RenderPassId(u32::MAX)]
        );
        assert_eq!(solid_colors(&frame.render_passes[0]), vec![Color::GREEN]);
        assert_eq!(solid_colors(&frame.render_passes[1]), vec![Color::RED]);
        assert_eq!(
            consumed_passes(frame.root_pass().expect("root pass")),
            vec![RenderPassId(1)]
        );
    }

    #[test]
    fn missing_root_yields_empty_frame() {
        let mut manager = SurfaceManager::new();
        assert!(SurfaceAggregator::new(&manager).aggregate(SurfaceId(1)).is_empty());
        let root = manager.create_surface(VIEWPORT);
        let frame = SurfaceAggregator::new(&manager).aggregate(root);
        assert!(frame.is_empty(), "frameless root aggregates to nothing");
        assert_eq!(frame.size, VIEWPORT);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn skips_are_traced() {
        use stratum_core::trace::TraceSink;

        #[derive(Default)]
        struct Skips(Vec<SkipReason>, usize);
        impl TraceSink for Skips {
            fn on_surface_skip(&mut self, e: &SurfaceSkipEvent) {
                self.0.push(e.reason);
            }
            fn on_aggregate(&mut self, e: &AggregateEvent) {
                self.1 = e.embedded_surfaces;
            }
        }

        let mut manager = SurfaceManager::new();
        let root = manager.create_surface(VIEWPORT);
        let frameless = manager.create_surface(VIEWPORT);
        submit(
            &mut manager,
            root,
            VIEWPORT,
            vec![pass(
                1,
                VIEWPORT,
                &[
                    embed(SurfaceId(0xDEAD), VIEWPORT),
                    embed(frameless, VIEWPORT),
                    embed(root, VIEWPORT),
                ],
            )],
        );

        let mut sink = Skips::default();
        SurfaceAggregator::new(&manager)
            .with_tracer(Tracer::new(&mut sink))
            .aggregate(root);
        assert_eq!(
            sink.0,
            vec![SkipReason::Missing, SkipReason::NoFrame, SkipReason::Cycle]
        );
        assert_eq!(sink.1, 0);
    }
}
