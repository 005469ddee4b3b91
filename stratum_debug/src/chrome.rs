// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const TID_SURFACES: u32 = 0;
const TID_OCCLUSION: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of instant events, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Events carry no clock, so each event's position in the recording is used
/// as its timestamp in microseconds. Aggregation events go on thread 0,
/// occlusion events on thread 1.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes)
        .enumerate()
        .map(|(seq, recorded)| to_json(seq, recorded))
        .collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(seq: usize, name: &str, cat: &str, tid: u32, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": seq,
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

fn to_json(seq: usize, recorded: RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::Aggregate(e) => instant(
            seq,
            "Aggregate",
            "Surfaces",
            TID_SURFACES,
            json!({
                "root": format!("{:?}", e.root),
                "render_passes": e.render_passes,
                "quads": e.quads,
                "embedded_surfaces": e.embedded_surfaces,
            }),
        ),
        RecordedEvent::SurfaceEmbed(e) => instant(
            seq,
            "SurfaceEmbed",
            "Surfaces",
            TID_SURFACES,
            json!({
                "surface": format!("{:?}", e.surface),
                "depth": e.depth,
            }),
        ),
        RecordedEvent::SurfaceSkip(e) => instant(
            seq,
            "SurfaceSkip",
            "Surfaces",
            TID_SURFACES,
            json!({
                "surface": format!("{:?}", e.surface),
                "depth": e.depth,
                "reason": format!("{:?}", e.reason),
            }),
        ),
        RecordedEvent::RenderTarget(e) => instant(
            seq,
            &format!("RenderTarget{:?}", e.op),
            "Occlusion",
            TID_OCCLUSION,
            json!({ "stack_depth": e.stack_depth }),
        ),
        RecordedEvent::OcclusionCleared(e) => instant(
            seq,
            "OcclusionCleared",
            "Occlusion",
            TID_OCCLUSION,
            json!({
                "reason": format!("{:?}", e.reason),
                "stack_depth": e.stack_depth,
            }),
        ),
        RecordedEvent::Occluder(e) => instant(
            seq,
            "Occluder",
            "Rich",
            TID_OCCLUSION,
            json!({
                "rect": [e.rect.x, e.rect.y, e.rect.width, e.rect.height],
                "accepted": e.accepted,
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use stratum_core::surface_id::SurfaceId;
    use stratum_core::trace::{
        ClearReason, OcclusionClearedEvent, RenderTargetEvent, SkipReason, StackOp,
        SurfaceSkipEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_surface_skip(&SurfaceSkipEvent {
            surface: SurfaceId::from_parts(0, 4),
            depth: 1,
            reason: SkipReason::NoFrame,
        });
        rec.on_render_target(&RenderTargetEvent {
            op: StackOp::Enter,
            stack_depth: 1,
        });
        rec.on_occlusion_cleared(&OcclusionClearedEvent {
            reason: ClearReason::Opacity,
            stack_depth: 1,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["name"], "SurfaceSkip");
        assert_eq!(parsed[0]["args"]["reason"], "NoFrame");
        assert_eq!(parsed[0]["tid"], 0);

        assert_eq!(parsed[1]["name"], "RenderTargetEnter");
        assert_eq!(parsed[1]["tid"], 1);

        assert_eq!(parsed[2]["ph"], "i");
        assert_eq!(parsed[2]["args"]["reason"], "Opacity");
        let ts: Vec<_> = parsed.iter().map(|e| e["ts"].as_u64()).collect();
        assert_eq!(ts, [Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty(), "no events recorded");
    }
}
