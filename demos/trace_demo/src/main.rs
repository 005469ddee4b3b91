// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aggregates a small surface hierarchy and runs occlusion over a layer tree
//! while tracing both.
//!
//! Events go to a [`PrettyPrintSink`](stratum_debug::pretty::PrettyPrintSink)
//! on stdout and a [`RecorderSink`](stratum_debug::recorder::RecorderSink);
//! the recording is then exported as a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use stratum_core::effects::{FilterOperation, FilterOperations};
use stratum_core::geometry::{IntRect, IntSize};
use stratum_core::layer::{LayerEffects, LayerId, LayerStore};
use stratum_core::trace::{
    AggregateEvent, OccluderEvent, OcclusionClearedEvent, RenderTargetEvent, SurfaceEmbedEvent,
    SurfaceSkipEvent, TraceSink, Tracer,
};
use stratum_core::transform::Transform3d;
use stratum_occlusion::{LiveTree, OcclusionConfig, OcclusionTracker, Visit, front_to_back};
use stratum_render::{Color, DrawQuad, Frame, RenderPass, RenderPassId, SharedQuadState};
use stratum_surfaces::{SurfaceAggregator, SurfaceManager};

use stratum_debug::pretty::PrettyPrintSink;
use stratum_debug::recorder::RecorderSink;

const SCREEN: IntRect = IntRect::new(0, 0, 200, 100);

/// Forwards every event to both sinks.
struct FanOut<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

impl TraceSink for FanOut<'_> {
    fn on_aggregate(&mut self, e: &AggregateEvent) {
        self.pretty.on_aggregate(e);
        self.recorder.on_aggregate(e);
    }

    fn on_surface_embed(&mut self, e: &SurfaceEmbedEvent) {
        self.pretty.on_surface_embed(e);
        self.recorder.on_surface_embed(e);
    }

    fn on_surface_skip(&mut self, e: &SurfaceSkipEvent) {
        self.pretty.on_surface_skip(e);
        self.recorder.on_surface_skip(e);
    }

    fn on_render_target(&mut self, e: &RenderTargetEvent) {
        self.pretty.on_render_target(e);
        self.recorder.on_render_target(e);
    }

    fn on_occlusion_cleared(&mut self, e: &OcclusionClearedEvent) {
        self.pretty.on_occlusion_cleared(e);
        self.recorder.on_occlusion_cleared(e);
    }

    fn on_occluder(&mut self, e: &OccluderEvent) {
        self.pretty.on_occluder(e);
        self.recorder.on_occluder(e);
    }
}

fn main() {
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    {
        let mut fan = FanOut {
            pretty: &mut pretty,
            recorder: &mut recorder,
        };
        aggregate_surfaces(&mut fan);
        track_occlusion(&mut fan);
    }

    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    stratum_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}

fn solid_frame(size: IntSize, color: Color) -> Frame {
    let mut pass = RenderPass::new(RenderPassId(1), IntRect::from_size(size));
    let sqs = pass.push_shared_quad_state(SharedQuadState::new(Transform3d::IDENTITY, size));
    pass.push_quad(DrawQuad::solid_color(sqs, IntRect::from_size(size), color));
    let mut frame = Frame::new(size);
    frame.render_passes.push(pass);
    frame
}

/// A page embedding a video surface and a surface that never arrives.
fn aggregate_surfaces(sink: &mut dyn TraceSink) {
    let mut manager = SurfaceManager::new();
    let page = manager.create_surface(SCREEN.size());
    let video = manager.create_surface(IntSize::new(80, 60));
    let never_submitted = manager.allocate_surface_id();

    manager
        .queue_frame(video, solid_frame(IntSize::new(80, 60), Color::RED))
        .expect("video surface is registered with a matching size");

    let mut pass = RenderPass::new(RenderPassId(1), SCREEN);
    let placed = pass.push_shared_quad_state(SharedQuadState::new(
        Transform3d::from_translation(20.0, 20.0, 0.0),
        IntSize::new(80, 60),
    ));
    pass.push_quad(DrawQuad::surface(
        placed,
        IntRect::new(0, 0, 80, 60),
        video,
    ));
    pass.push_quad(DrawQuad::surface(
        placed,
        IntRect::new(0, 0, 80, 60),
        never_submitted,
    ));
    let background =
        pass.push_shared_quad_state(SharedQuadState::new(Transform3d::IDENTITY, SCREEN.size()));
    pass.push_quad(DrawQuad::solid_color(background, SCREEN, Color::WHITE));
    let mut frame = Frame::new(SCREEN.size());
    frame.render_passes.push(pass);
    manager
        .queue_frame(page, frame)
        .expect("page surface is registered with a matching size");

    let frame = SurfaceAggregator::new(&manager)
        .with_tracer(Tracer::new(sink))
        .aggregate(page);
    println!(
        "aggregated: {} pass(es), {} quad(s)",
        frame.render_passes.len(),
        frame.quad_count()
    );
}

fn opaque_layer(store: &mut LayerStore, parent: LayerId, rect: IntRect) -> LayerId {
    let id = store.create_layer();
    store.add_child(parent, id);
    store.set_bounds(id, rect.size());
    store.set_transform(
        id,
        Transform3d::from_translation(f64::from(rect.x), f64::from(rect.y), 0.0),
    );
    store.set_contents_opaque(id, true);
    id
}

/// A window with a video, a frosted-glass panel and a translucent badge.
fn track_occlusion(sink: &mut dyn TraceSink) {
    let mut store = LayerStore::new();
    let root = store.create_layer();
    store.set_bounds(root, SCREEN.size());
    let _background = opaque_layer(&mut store, root, SCREEN);
    let video = opaque_layer(&mut store, root, IntRect::new(20, 20, 80, 60));

    let panel = opaque_layer(&mut store, root, IntRect::new(120, 10, 60, 60));
    store.set_effects(
        panel,
        LayerEffects {
            backdrop_filters: [FilterOperation::Blur(2.0)].into_iter().collect(),
            ..LayerEffects::default()
        },
    );

    let badge = opaque_layer(&mut store, root, IntRect::new(90, 70, 30, 20));
    store.set_opacity(badge, 0.5);
    let mut badge_filters = FilterOperations::new();
    badge_filters.push(FilterOperation::Opacity(0.8));
    store.set_effects(
        badge,
        LayerEffects {
            filters: badge_filters,
            ..LayerEffects::default()
        },
    );
    let _ = store.evaluate();

    let positions = front_to_back(&store, root);
    let mut tracker = OcclusionTracker::new(LiveTree(&store), OcclusionConfig::new(SCREEN))
        .with_tracer(Tracer::new(sink));
    for position in &positions {
        tracker.enter_layer(position);
        if position.visit == Visit::Itself && position.current_layer == video {
            let unoccluded = tracker
                .get_current_occlusion_for_layer(store.draw_transform(video))
                .get_unoccluded_content_rect(store.visible_content_rect(video));
            println!("video still draws {unoccluded:?}");
        }
        tracker.leave_layer(position);
    }

    let visible = tracker.compute_visible_region_in_screen();
    println!("visible area {} of {}", visible.area(), SCREEN.area());
    for rect in visible.iter() {
        println!("  {rect:?}");
    }
}
