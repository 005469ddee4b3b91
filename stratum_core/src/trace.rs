// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for aggregation and occlusion.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! surface aggregator and the occlusion tracker call as they work. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`OccluderEvent`] and the
//!   corresponding `TraceSink` method, which fire once per candidate occluder
//!   rectangle.

#[cfg(feature = "trace-rich")]
use crate::geometry::IntRect;
use crate::surface_id::SurfaceId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a referenced surface was not spliced into the aggregated frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// No surface is registered under the id.
    Missing,
    /// The surface exists but has no frame (or an empty one).
    NoFrame,
    /// The surface is already being embedded further up the chain.
    Cycle,
    /// Embedding would exceed the configured depth limit.
    DepthLimit,
}

/// Which render-target stack transition happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StackOp {
    /// A new render target was pushed.
    Enter,
    /// All layers of the top target have been visited.
    Finish,
    /// The finished target was merged into (or replaced by) its parent.
    Leave,
}

/// Why a finished render target's occlusion was discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClearReason {
    /// The surface is drawn through a mask.
    Mask,
    /// The surface opacity is below one or not known.
    Opacity,
    /// The surface uses a non-normal blend mode.
    BlendMode,
    /// The surface only exists to service a hidden copy request.
    CopyRequest,
    /// A filter on the surface may change alpha.
    Filters,
    /// The surface's transform into its target is not known.
    TransformUnknown,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once per completed aggregation.
#[derive(Clone, Copy, Debug)]
pub struct AggregateEvent {
    /// The surface aggregation started from.
    pub root: SurfaceId,
    /// Render passes in the output frame.
    pub render_passes: usize,
    /// Quads in the output frame, across all passes.
    pub quads: usize,
    /// Surfaces spliced in, not counting the root.
    pub embedded_surfaces: usize,
}

/// Emitted when a referenced surface is spliced in.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceEmbedEvent {
    /// The embedded surface.
    pub surface: SurfaceId,
    /// Embedding depth (the root's direct references are depth 1).
    pub depth: usize,
}

/// Emitted when a referenced surface is skipped.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceSkipEvent {
    /// The referenced surface.
    pub surface: SurfaceId,
    /// Depth at which the reference was found.
    pub depth: usize,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Emitted on every render-target stack transition.
#[derive(Clone, Copy, Debug)]
pub struct RenderTargetEvent {
    /// The transition.
    pub op: StackOp,
    /// Stack depth after the transition.
    pub stack_depth: usize,
}

/// Emitted when a finished target's occlusion is discarded.
#[derive(Clone, Copy, Debug)]
pub struct OcclusionClearedEvent {
    /// Why the occlusion was discarded.
    pub reason: ClearReason,
    /// Stack depth of the target.
    pub stack_depth: usize,
}

/// Emitted for each candidate occluder rectangle (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct OccluderEvent {
    /// The candidate, in target space.
    pub rect: IntRect,
    /// `false` if the rect fell below the minimum tracking size.
    pub accepted: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives diagnostic events.
///
/// Every method has a default no-op body.
pub trait TraceSink {
    /// Called when an aggregation completes.
    fn on_aggregate(&mut self, e: &AggregateEvent) {
        _ = e;
    }

    /// Called when a surface is spliced in.
    fn on_surface_embed(&mut self, e: &SurfaceEmbedEvent) {
        _ = e;
    }

    /// Called when a surface reference is skipped.
    fn on_surface_skip(&mut self, e: &SurfaceSkipEvent) {
        _ = e;
    }

    /// Called on render-target stack transitions.
    fn on_render_target(&mut self, e: &RenderTargetEvent) {
        _ = e;
    }

    /// Called when a finished target's occlusion is discarded.
    fn on_occlusion_cleared(&mut self, e: &OcclusionClearedEvent) {
        _ = e;
    }

    /// Called for each candidate occluder (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_occluder(&mut self, e: &OccluderEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`AggregateEvent`].
    #[inline]
    pub fn aggregate(&mut self, e: &AggregateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_aggregate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceEmbedEvent`].
    #[inline]
    pub fn surface_embed(&mut self, e: &SurfaceEmbedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface_embed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceSkipEvent`].
    #[inline]
    pub fn surface_skip(&mut self, e: &SurfaceSkipEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface_skip(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderTargetEvent`].
    #[inline]
    pub fn render_target(&mut self, e: &RenderTargetEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_target(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`OcclusionClearedEvent`].
    #[inline]
    pub fn occlusion_cleared(&mut self, e: &OcclusionClearedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_occlusion_cleared(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`OccluderEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn occluder(&mut self, e: &OccluderEvent) {
        if let Some(s) = &mut self.sink {
            s.on_occluder(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
