// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surfaces, the surface registry, and frame aggregation.
//!
//! Every independently producing context (an embedded document, a plugin, a
//! separate process) owns a [`Surface`] and submits [`Frame`]s to it. Frames
//! embed one another through [`Material::Surface`] quads. Once per output
//! frame, [`SurfaceAggregator::aggregate`] starts from a root surface and
//! splices every reachable surface's current frame in place of the quads that
//! reference it, producing one flat [`Frame`] a renderer can draw pass by
//! pass.
//!
//! Aggregation never fails. References to missing surfaces, surfaces without
//! a frame, cyclic references and references nested deeper than
//! [`AggregatorConfig::max_embed_depth`] draw nothing.
//!
//! [`Frame`]: stratum_render::Frame
//! [`Material::Surface`]: stratum_render::Material::Surface
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Forwards aggregation events to a
//!   [`TraceSink`](stratum_core::trace::TraceSink).

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod aggregator;
mod manager;
mod surface;

pub use aggregator::{AggregatorConfig, SurfaceAggregator};
pub use manager::{RegisterError, SurfaceManager};
pub use surface::{QueueFrameError, Surface};
