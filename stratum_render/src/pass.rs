// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render passes and frames.

use alloc::vec::Vec;
use core::fmt;

use stratum_core::geometry::{IntRect, IntSize};
use stratum_core::transform::Transform3d;

use crate::quad::{DrawQuad, SharedQuadState};

/// Identifies a render pass within one frame.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RenderPassId(pub u32);

impl fmt::Debug for RenderPassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderPassId({})", self.0)
    }
}

/// An ordered batch of quads drawn into one target.
///
/// Quads reference shared states by index, so a pass can be cloned or moved
/// without fixing up pointers.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPass {
    /// Unique within the owning frame.
    pub id: RenderPassId,
    /// The pass's output area, in its own space.
    pub output_rect: IntRect,
    /// The part of `output_rect` that changed.
    pub damage_rect: IntRect,
    /// Maps the pass's space to the root target.
    pub transform_to_root_target: Transform3d,
    /// Shared states, appended before the quads that use them.
    pub shared_quad_states: Vec<SharedQuadState>,
    /// Quads, front to back.
    pub quads: Vec<DrawQuad>,
}

impl RenderPass {
    /// Creates an empty pass whose damage covers the whole output.
    #[must_use]
    pub fn new(id: RenderPassId, output_rect: IntRect) -> Self {
        Self {
            id,
            output_rect,
            damage_rect: output_rect,
            transform_to_root_target: Transform3d::IDENTITY,
            shared_quad_states: Vec::new(),
            quads: Vec::new(),
        }
    }

    /// Copies everything except the shared states and quads.
    #[must_use]
    pub fn copy_without_quads(&self, id: RenderPassId) -> Self {
        Self {
            id,
            output_rect: self.output_rect,
            damage_rect: self.damage_rect,
            transform_to_root_target: self.transform_to_root_target,
            shared_quad_states: Vec::new(),
            quads: Vec::new(),
        }
    }

    /// Appends a shared state and returns its index.
    pub fn push_shared_quad_state(&mut self, state: SharedQuadState) -> usize {
        self.shared_quad_states.push(state);
        self.shared_quad_states.len() - 1
    }

    /// Appends a quad behind every quad already in the pass.
    ///
    /// # Panics
    ///
    /// Panics if the quad's shared state has not been pushed yet.
    pub fn push_quad(&mut self, quad: DrawQuad) {
        assert!(
            quad.shared_quad_state < self.shared_quad_states.len(),
            "quad references shared quad state {} but the pass only has {}",
            quad.shared_quad_state,
            self.shared_quad_states.len()
        );
        self.quads.push(quad);
    }

    /// The shared state a quad of this pass references.
    ///
    /// # Panics
    ///
    /// Panics if the quad does not belong to this pass.
    #[inline]
    #[must_use]
    pub fn shared_quad_state_for(&self, quad: &DrawQuad) -> &SharedQuadState {
        &self.shared_quad_states[quad.shared_quad_state]
    }
}

/// One complete submission of draw content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Logical size of the frame.
    pub size: IntSize,
    /// Passes in draw order; the last one is the root.
    pub render_passes: Vec<RenderPass>,
}

impl Frame {
    /// Creates a frame with no passes.
    #[must_use]
    pub fn new(size: IntSize) -> Self {
        Self {
            size,
            render_passes: Vec::new(),
        }
    }

    /// Returns `true` if the frame has no passes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.render_passes.is_empty()
    }

    /// The pass that is drawn last, onto the frame's output.
    #[inline]
    #[must_use]
    pub fn root_pass(&self) -> Option<&RenderPass> {
        self.render_passes.last()
    }

    /// Looks up a pass by id.
    #[must_use]
    pub fn pass(&self, id: RenderPassId) -> Option<&RenderPass> {
        self.render_passes.iter().find(|p| p.id == id)
    }

    /// Total quads across all passes.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.render_passes.iter().map(|p| p.quads.len()).sum()
    }
}
