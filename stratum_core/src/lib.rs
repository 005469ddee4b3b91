// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for surface aggregation and occlusion tracking.
//!
//! `stratum_core` provides the spatial building blocks shared by the
//! aggregation and occlusion crates. It is `no_std` compatible (with `alloc`)
//! and stores its layer tree in struct-of-arrays form with index handles for
//! cache-friendly traversal.
//!
//! # Architecture
//!
//! ```text
//!   LayerStore (local properties, dirty tracking)
//!       │
//!       ▼
//!   LayerStore::evaluate() ──► FrameChanges + draw properties
//!                                   │
//!                 ┌─────────────────┘
//!                 ▼
//!   render targets, draw transforms, clips ──► occlusion traversal
//! ```
//!
//! **[`geometry`]**: Integer pixel rectangles and sizes, with conversions to
//! and from [`kurbo::Rect`].
//!
//! **[`transform`]**: 4×4 transform type with inversion, axis-alignment
//! checks, and the clipped mapping/projection helpers the occlusion tracker
//! relies on.
//!
//! **[`region`]**: [`SimpleEnclosedRegion`](region::SimpleEnclosedRegion), a
//! bounded under-approximation used for accumulated occlusion, and
//! [`Region`](region::Region), an exact rectangle set used for the final
//! visible-area answer.
//!
//! **[`effects`]**: Blend modes and filter operations, including the
//! pixel-moving outsets that backdrop filters apply.
//!
//! **[`layer`]**: Struct-of-arrays layer tree with generational handles.
//! Evaluation assigns render targets and computes draw properties.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! aggregation and occlusion instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-occluder
//!   events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod effects;
pub mod geometry;
pub mod layer;
pub mod region;
pub mod surface_id;
pub mod trace;
pub mod transform;
