// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blend modes and filter chains.
//!
//! Occlusion only needs to know two things about a filter chain: whether it
//! can change alpha (so the filtered content cannot occlude), and whether it
//! reads pixels from outside a region (so what lies underneath must still be
//! drawn). [`FilterOperations`] answers both and reports how far the pixel
//! reads reach via [`FilterOutsets`].

use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Blend mode used to composite a layer or quad onto what lies beneath it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    Normal,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
    /// Overlay blend.
    Overlay,
    /// Darken blend.
    Darken,
    /// Lighten blend.
    Lighten,
    /// Difference blend.
    Difference,
}

impl BlendMode {
    /// Returns `true` for [`BlendMode::Normal`].
    #[inline]
    #[must_use]
    pub const fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// A single filter in a chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOperation {
    /// Gaussian blur with the given standard deviation in pixels.
    Blur(f32),
    /// Offset, blurred copy of the content drawn beneath it.
    DropShadow {
        /// Horizontal shadow offset.
        offset_x: i32,
        /// Vertical shadow offset.
        offset_y: i32,
        /// Blur standard deviation in pixels.
        radius: f32,
    },
    /// Alpha multiplier.
    Opacity(f32),
    /// Brightness multiplier.
    Brightness(f32),
    /// Grayscale amount in `[0, 1]`.
    Grayscale(f32),
    /// Magnifier: scales content inside an inset border.
    Zoom {
        /// Magnification factor.
        amount: f32,
        /// Width of the unscaled border.
        inset: i32,
    },
}

impl FilterOperation {
    /// Returns `true` if the filter may change the alpha channel.
    #[must_use]
    pub const fn affects_opacity(&self) -> bool {
        matches!(
            self,
            Self::Opacity(_) | Self::Blur(_) | Self::DropShadow { .. } | Self::Zoom { .. }
        )
    }

    /// Returns `true` if output pixels depend on input pixels elsewhere.
    #[must_use]
    pub const fn moves_pixels(&self) -> bool {
        matches!(
            self,
            Self::Blur(_) | Self::DropShadow { .. } | Self::Zoom { .. }
        )
    }
}

/// How far a filter chain reaches beyond the filtered area, per edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterOutsets {
    /// Reach above the top edge.
    pub top: i32,
    /// Reach past the right edge.
    pub right: i32,
    /// Reach below the bottom edge.
    pub bottom: i32,
    /// Reach past the left edge.
    pub left: i32,
}

/// Pixel reach of a blur with standard deviation `sigma`.
#[allow(
    clippy::cast_possible_truncation,
    reason = "blur radii are small; the cast saturates otherwise"
)]
fn blur_spread(sigma: f32) -> i32 {
    (f64::from(sigma.max(0.0)) * 3.0).ceil() as i32
}

/// An ordered chain of filter operations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterOperations {
    ops: Vec<FilterOperation>,
}

impl FilterOperations {
    /// Creates an empty chain.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Appends an operation.
    pub fn push(&mut self, op: FilterOperation) {
        self.ops.push(op);
    }

    /// Returns `true` if the chain has no operations.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The operations in application order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[FilterOperation] {
        &self.ops
    }

    /// Returns `true` if any operation may change alpha.
    #[must_use]
    pub fn has_filter_that_affects_opacity(&self) -> bool {
        self.ops.iter().any(FilterOperation::affects_opacity)
    }

    /// Returns `true` if any operation reads neighboring pixels.
    #[must_use]
    pub fn has_filter_that_moves_pixels(&self) -> bool {
        self.ops.iter().any(FilterOperation::moves_pixels)
    }

    /// Accumulated reach of the whole chain.
    #[must_use]
    pub fn outsets(&self) -> FilterOutsets {
        let mut out = FilterOutsets::default();
        for op in &self.ops {
            match *op {
                FilterOperation::Blur(sigma) => {
                    let spread = blur_spread(sigma);
                    out.top += spread;
                    out.right += spread;
                    out.bottom += spread;
                    out.left += spread;
                }
                FilterOperation::DropShadow {
                    offset_x,
                    offset_y,
                    radius,
                } => {
                    let spread = blur_spread(radius);
                    out.top += (spread - offset_y).max(0);
                    out.right += (spread + offset_x).max(0);
                    out.bottom += (spread + offset_y).max(0);
                    out.left += (spread - offset_x).max(0);
                }
                _ => {}
            }
        }
        out
    }
}

impl FromIterator<FilterOperation> for FilterOperations {
    fn from_iter<I: IntoIterator<Item = FilterOperation>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}
