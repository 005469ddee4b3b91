// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use stratum_core::geometry::IntRect;
use stratum_core::surface_id::SurfaceId;
use stratum_core::trace::{
    AggregateEvent, ClearReason, OccluderEvent, OcclusionClearedEvent, RenderTargetEvent,
    SkipReason, StackOp, SurfaceEmbedEvent, SurfaceSkipEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_AGGREGATE: u8 = 1;
const TAG_SURFACE_EMBED: u8 = 2;
const TAG_SURFACE_SKIP: u8 = 3;
const TAG_RENDER_TARGET: u8 = 4;
const TAG_OCCLUSION_CLEARED: u8 = 5;
const TAG_OCCLUDER: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u64(u64::try_from(v).unwrap_or(u64::MAX));
    }

    fn write_rect(&mut self, r: IntRect) {
        self.write_i32(r.x);
        self.write_i32(r.y);
        self.write_i32(r.width);
        self.write_i32(r.height);
    }
}

fn skip_reason_code(r: SkipReason) -> u8 {
    match r {
        SkipReason::Missing => 0,
        SkipReason::NoFrame => 1,
        SkipReason::Cycle => 2,
        SkipReason::DepthLimit => 3,
    }
}

fn stack_op_code(op: StackOp) -> u8 {
    match op {
        StackOp::Enter => 0,
        StackOp::Finish => 1,
        StackOp::Leave => 2,
    }
}

fn clear_reason_code(r: ClearReason) -> u8 {
    match r {
        ClearReason::Mask => 0,
        ClearReason::Opacity => 1,
        ClearReason::BlendMode => 2,
        ClearReason::CopyRequest => 3,
        ClearReason::Filters => 4,
        ClearReason::TransformUnknown => 5,
    }
}

impl TraceSink for RecorderSink {
    fn on_aggregate(&mut self, e: &AggregateEvent) {
        self.write_u8(TAG_AGGREGATE);
        self.write_u64(e.root.0);
        self.write_count(e.render_passes);
        self.write_count(e.quads);
        self.write_count(e.embedded_surfaces);
    }

    fn on_surface_embed(&mut self, e: &SurfaceEmbedEvent) {
        self.write_u8(TAG_SURFACE_EMBED);
        self.write_u64(e.surface.0);
        self.write_count(e.depth);
    }

    fn on_surface_skip(&mut self, e: &SurfaceSkipEvent) {
        self.write_u8(TAG_SURFACE_SKIP);
        self.write_u64(e.surface.0);
        self.write_count(e.depth);
        self.write_u8(skip_reason_code(e.reason));
    }

    fn on_render_target(&mut self, e: &RenderTargetEvent) {
        self.write_u8(TAG_RENDER_TARGET);
        self.write_u8(stack_op_code(e.op));
        self.write_count(e.stack_depth);
    }

    fn on_occlusion_cleared(&mut self, e: &OcclusionClearedEvent) {
        self.write_u8(TAG_OCCLUSION_CLEARED);
        self.write_u8(clear_reason_code(e.reason));
        self.write_count(e.stack_depth);
    }

    fn on_occluder(&mut self, e: &OccluderEvent) {
        self.write_u8(TAG_OCCLUDER);
        self.write_rect(e.rect);
        self.write_u8(u8::from(e.accepted));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// An [`AggregateEvent`].
    Aggregate(AggregateEvent),
    /// A [`SurfaceEmbedEvent`].
    SurfaceEmbed(SurfaceEmbedEvent),
    /// A [`SurfaceSkipEvent`].
    SurfaceSkip(SurfaceSkipEvent),
    /// A [`RenderTargetEvent`].
    RenderTarget(RenderTargetEvent),
    /// An [`OcclusionClearedEvent`].
    OcclusionCleared(OcclusionClearedEvent),
    /// An [`OccluderEvent`].
    Occluder(OccluderEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_count(&mut self) -> Option<usize> {
        self.read_u64()
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
    }

    fn read_surface(&mut self) -> Option<SurfaceId> {
        self.read_u64().map(SurfaceId)
    }

    fn read_rect(&mut self) -> Option<IntRect> {
        Some(IntRect::new(
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
        ))
    }

    fn read_skip_reason(&mut self) -> Option<SkipReason> {
        Some(match self.read_u8()? {
            0 => SkipReason::Missing,
            1 => SkipReason::NoFrame,
            2 => SkipReason::Cycle,
            _ => SkipReason::DepthLimit,
        })
    }

    fn read_stack_op(&mut self) -> Option<StackOp> {
        Some(match self.read_u8()? {
            0 => StackOp::Enter,
            1 => StackOp::Finish,
            _ => StackOp::Leave,
        })
    }

    fn read_clear_reason(&mut self) -> Option<ClearReason> {
        Some(match self.read_u8()? {
            0 => ClearReason::Mask,
            1 => ClearReason::Opacity,
            2 => ClearReason::BlendMode,
            3 => ClearReason::CopyRequest,
            4 => ClearReason::Filters,
            _ => ClearReason::TransformUnknown,
        })
    }

    fn decode_aggregate(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Aggregate(AggregateEvent {
            root: self.read_surface()?,
            render_passes: self.read_count()?,
            quads: self.read_count()?,
            embedded_surfaces: self.read_count()?,
        }))
    }

    fn decode_surface_embed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceEmbed(SurfaceEmbedEvent {
            surface: self.read_surface()?,
            depth: self.read_count()?,
        }))
    }

    fn decode_surface_skip(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceSkip(SurfaceSkipEvent {
            surface: self.read_surface()?,
            depth: self.read_count()?,
            reason: self.read_skip_reason()?,
        }))
    }

    fn decode_render_target(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderTarget(RenderTargetEvent {
            op: self.read_stack_op()?,
            stack_depth: self.read_count()?,
        }))
    }

    fn decode_occlusion_cleared(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::OcclusionCleared(OcclusionClearedEvent {
            reason: self.read_clear_reason()?,
            stack_depth: self.read_count()?,
        }))
    }

    fn decode_occluder(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Occluder(OccluderEvent {
            rect: self.read_rect()?,
            accepted: self.read_u8()? != 0,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_AGGREGATE => self.decode_aggregate(),
            TAG_SURFACE_EMBED => self.decode_surface_embed(),
            TAG_SURFACE_SKIP => self.decode_surface_skip(),
            TAG_RENDER_TARGET => self.decode_render_target(),
            TAG_OCCLUSION_CLEARED => self.decode_occlusion_cleared(),
            TAG_OCCLUDER => self.decode_occluder(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
