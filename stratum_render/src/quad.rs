// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw quads and the state they share.

use core::fmt;

use stratum_core::effects::BlendMode;
use stratum_core::geometry::{IntRect, IntSize};
use stratum_core::surface_id::SurfaceId;
use stratum_core::transform::Transform3d;

use crate::pass::RenderPassId;
use crate::resource::ResourceKey;

/// A 32-bit ARGB color, alpha in the high byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque red.
    pub const RED: Self = Self(0xFFFF_0000);
    /// Opaque green.
    pub const GREEN: Self = Self(0xFF00_FF00);
    /// Opaque blue.
    pub const BLUE: Self = Self(0xFF00_00FF);
    /// Opaque yellow.
    pub const YELLOW: Self = Self(0xFFFF_FF00);

    /// Packs the four channels.
    #[inline]
    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// The alpha channel.
    #[inline]
    #[must_use]
    pub const fn alpha(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Returns `true` if the alpha channel is 255.
    #[inline]
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.alpha() == 0xFF
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Attributes shared by a run of quads in one render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SharedQuadState {
    /// Maps quad content space into the pass's target space.
    pub content_to_target_transform: Transform3d,
    /// Size of the content the quads are cut from.
    pub content_bounds: IntSize,
    /// Part of the content that is visible, in content space.
    pub visible_content_rect: IntRect,
    /// Clip in target space. Only meaningful when `is_clipped` is set.
    pub clip_rect: IntRect,
    /// Whether `clip_rect` applies.
    pub is_clipped: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// How the quads composite onto what is below them.
    pub blend_mode: BlendMode,
}

impl SharedQuadState {
    /// Unclipped, opaque, normal-blended state covering all of `content_bounds`.
    #[must_use]
    pub const fn new(content_to_target_transform: Transform3d, content_bounds: IntSize) -> Self {
        Self {
            content_to_target_transform,
            content_bounds,
            visible_content_rect: IntRect::from_size(content_bounds),
            clip_rect: IntRect::ZERO,
            is_clipped: false,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
        }
    }

    /// Sets a target-space clip.
    #[must_use]
    pub const fn with_clip(mut self, clip_rect: IntRect) -> Self {
        self.clip_rect = clip_rect;
        self.is_clipped = true;
        self
    }

    /// Sets the opacity.
    #[must_use]
    pub const fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Sets the blend mode.
    #[must_use]
    pub const fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// The clip, if any.
    #[inline]
    #[must_use]
    pub const fn clip(&self) -> Option<IntRect> {
        if self.is_clipped {
            Some(self.clip_rect)
        } else {
            None
        }
    }
}

/// What a quad draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    /// A flat color.
    SolidColor {
        /// The color.
        color: Color,
        /// Draw with hard edges even under fractional transforms.
        force_anti_aliasing_off: bool,
    },
    /// "Draw the current frame of this surface here."
    ///
    /// Resolved by aggregation; never reaches a renderer.
    Surface {
        /// The embedded surface.
        surface_id: SurfaceId,
    },
    /// The output of another render pass in the same frame.
    RenderPass {
        /// The consumed pass.
        pass_id: RenderPassId,
    },
    /// A producer-owned texture.
    Texture {
        /// The texture.
        resource: ResourceKey,
        /// Whether color channels are already multiplied by alpha.
        premultiplied_alpha: bool,
    },
}

/// One drawable primitive.
///
/// `shared_quad_state` indexes the owning pass's shared-state list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawQuad {
    /// What to draw.
    pub material: Material,
    /// Quad rect, in content space.
    pub rect: IntRect,
    /// Part of `rect` that is visible, in content space.
    pub visible_rect: IntRect,
    /// Index into [`RenderPass::shared_quad_states`](crate::RenderPass::shared_quad_states).
    pub shared_quad_state: usize,
}

impl DrawQuad {
    /// A solid color quad.
    #[must_use]
    pub const fn solid_color(shared_quad_state: usize, rect: IntRect, color: Color) -> Self {
        Self {
            material: Material::SolidColor {
                color,
                force_anti_aliasing_off: false,
            },
            rect,
            visible_rect: rect,
            shared_quad_state,
        }
    }

    /// A reference to another surface's frame.
    #[must_use]
    pub const fn surface(shared_quad_state: usize, rect: IntRect, surface_id: SurfaceId) -> Self {
        Self {
            material: Material::Surface { surface_id },
            rect,
            visible_rect: rect,
            shared_quad_state,
        }
    }

    /// A quad drawing another pass's output.
    #[must_use]
    pub const fn render_pass(
        shared_quad_state: usize,
        rect: IntRect,
        pass_id: RenderPassId,
    ) -> Self {
        Self {
            material: Material::RenderPass { pass_id },
            rect,
            visible_rect: rect,
            shared_quad_state,
        }
    }

    /// A texture quad with premultiplied alpha.
    #[must_use]
    pub const fn texture(shared_quad_state: usize, rect: IntRect, resource: ResourceKey) -> Self {
        Self {
            material: Material::Texture {
                resource,
                premultiplied_alpha: true,
            },
            rect,
            visible_rect: rect,
            shared_quad_state,
        }
    }

    /// The referenced surface, for [`Material::Surface`] quads.
    #[inline]
    #[must_use]
    pub const fn surface_id(&self) -> Option<SurfaceId> {
        match self.material {
            Material::Surface { surface_id } => Some(surface_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_channels() {
        let c = Color::from_argb(0x80, 0x12, 0x34, 0x56);
        assert_eq!(c.0, 0x8012_3456, "channels pack in ARGB order");
        assert_eq!(c.alpha(), 0x80, "alpha is the high byte");
        assert!(!c.is_opaque(), "half alpha is not opaque");
        assert!(Color::GREEN.is_opaque(), "named colors are opaque");
    }

    #[test]
    fn shared_state_builders() {
        let sqs = SharedQuadState::new(Transform3d::IDENTITY, IntSize::new(10, 20))
            .with_clip(IntRect::new(0, 0, 5, 5))
            .with_opacity(0.5);
        assert_eq!(sqs.visible_content_rect, IntRect::new(0, 0, 10, 20));
        assert_eq!(sqs.clip(), Some(IntRect::new(0, 0, 5, 5)));
        assert_eq!(sqs.opacity, 0.5);
        assert!(sqs.blend_mode.is_normal(), "default blend mode is normal");
    }

    #[test]
    fn surface_quad_reports_its_surface() {
        let id = SurfaceId::from_parts(1, 2);
        let quad = DrawQuad::surface(0, IntRect::new(0, 0, 1, 1), id);
        assert_eq!(quad.surface_id(), Some(id));
        let solid = DrawQuad::solid_color(0, IntRect::new(0, 0, 1, 1), Color::RED);
        assert_eq!(solid.surface_id(), None);
    }
}
