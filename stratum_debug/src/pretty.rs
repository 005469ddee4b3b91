// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use stratum_core::geometry::IntRect;
use stratum_core::surface_id::SurfaceId;
use stratum_core::trace::{
    AggregateEvent, OccluderEvent, OcclusionClearedEvent, RenderTargetEvent, StackOp,
    SurfaceEmbedEvent, SurfaceSkipEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

struct Sid(SurfaceId);

impl std::fmt::Display for Sid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.0.namespace(), self.0.local())
    }
}

struct Rect(IntRect);

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = self.0;
        write!(f, "({},{} {}x{})", r.x, r.y, r.width, r.height)
    }
}

fn op_name(op: StackOp) -> &'static str {
    match op {
        StackOp::Enter => "enter",
        StackOp::Finish => "finish",
        StackOp::Leave => "leave",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_aggregate(&mut self, e: &AggregateEvent) {
        let _ = writeln!(
            self.writer,
            "[aggregate] root={} passes={} quads={} embedded={}",
            Sid(e.root),
            e.render_passes,
            e.quads,
            e.embedded_surfaces,
        );
    }

    fn on_surface_embed(&mut self, e: &SurfaceEmbedEvent) {
        let _ = writeln!(
            self.writer,
            "[embed] surface={} depth={}",
            Sid(e.surface),
            e.depth,
        );
    }

    fn on_surface_skip(&mut self, e: &SurfaceSkipEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] surface={} depth={} reason={:?}",
            Sid(e.surface),
            e.depth,
            e.reason,
        );
    }

    fn on_render_target(&mut self, e: &RenderTargetEvent) {
        let _ = writeln!(
            self.writer,
            "[target:{}] depth={}",
            op_name(e.op),
            e.stack_depth,
        );
    }

    fn on_occlusion_cleared(&mut self, e: &OcclusionClearedEvent) {
        let _ = writeln!(
            self.writer,
            "[cleared] depth={} reason={:?}",
            e.stack_depth,
            e.reason,
        );
    }

    fn on_occluder(&mut self, e: &OccluderEvent) {
        let verdict = if e.accepted { "kept" } else { "too small" };
        let _ = writeln!(self.writer, "[occluder] {} {verdict}", Rect(e.rect));
    }
}
