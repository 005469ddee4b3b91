// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occlusion tracking for layer trees drawn front to back.
//!
//! An [`OcclusionTracker`] is fed a front-to-back walk of a tree of layers
//! and render targets. As each opaque layer is left, the area it covers in
//! its target is recorded; each layer about to be drawn can ask, through an
//! [`Occlusion`], which part of it is still visible.
//!
//! The tracker is generic over [`LayerTree`], a small capability trait that
//! exposes draw properties. [`LiveTree`] and [`CommittedTree`] adapt a
//! [`LayerStore`](stratum_core::layer::LayerStore): the live view treats
//! animating opacity and transforms as unknown, the committed view treats
//! every property as settled. [`front_to_back`] produces the walk.
//!
//! Occlusion is never over-claimed: whenever a transform is not invertible,
//! does not keep rectangles axis-aligned, or is animating, the operation that
//! needs it contributes nothing.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Forwards stack transitions to a
//!   [`TraceSink`](stratum_core::trace::TraceSink).
//! - `trace-rich` (disabled by default, implies `trace`): Also reports every
//!   candidate occluder rectangle.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod adapters;
mod iterator;
mod occlusion;
mod tracker;
mod tree;

pub use adapters::{CommittedTree, LiveTree, front_to_back};
pub use iterator::{LayerIteratorPosition, Visit};
pub use occlusion::Occlusion;
pub use tracker::{OcclusionConfig, OcclusionTracker, screen_space_clip_rect_in_target_surface};
pub use tree::{LayerProperties, LayerTree, SurfaceProperties};
