// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame data model for stratum.
//!
//! This crate defines the object graph that frame producers hand to surfaces
//! and that the aggregator flattens into a single output frame:
//!
//! - [`Frame`]: an ordered list of render passes plus a logical size
//! - [`RenderPass`]: quads and the shared states they reference by index
//! - [`SharedQuadState`]: transform, clip, opacity and blend mode shared by
//!   a run of quads
//! - [`DrawQuad`] and [`Material`]: one drawable primitive
//! - [`ResourceKey`]: opaque handle for producer-owned resources
//!
//! Within a pass, quads are ordered front to back: the first quad is the
//! topmost. Passes are ordered so that every pass is drawn before any pass
//! that consumes it, and the last pass is the root.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod pass;
mod quad;
mod resource;

pub use pass::{Frame, RenderPass, RenderPassId};
pub use quad::{Color, DrawQuad, Material, SharedQuadState};
pub use resource::ResourceKey;
pub use stratum_core::effects::BlendMode;
