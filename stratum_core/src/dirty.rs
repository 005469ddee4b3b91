// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The layer store uses multi-channel dirty tracking (via [`understory_dirty`])
//! to know which categories of layer state changed between two
//! [`evaluate`](crate::layer::LayerStore::evaluate) calls. Each channel
//! represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`TRANSFORM`] and [`OPACITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent, because draw transforms, screen-space
//!   transforms, draw opacities and effective hidden state are inherited.
//!   Flag changes (hidden, animating, forced surfaces) are routed through
//!   [`TRANSFORM`].
//!
//! - **Local-only**: [`CLIP`], [`CONTENT`] and [`EFFECTS`] are marked with
//!   the default policy. Only the explicitly marked layer appears in the drain
//!   output.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on topology mutations. It
//!   triggers a traversal-order rebuild but does not propagate.
//!
//! Any non-empty drain makes evaluation recompute draw properties for the
//! whole tree, since render-target assignment can move when a single layer
//! gains or loses a render surface.

use understory_dirty::Channel;

/// Transform or flags changed.
pub const TRANSFORM: Channel = Channel::new(0);

/// Opacity changed.
pub const OPACITY: Channel = Channel::new(1);

/// Clip rect changed.
pub const CLIP: Channel = Channel::new(2);

/// Bounds or opaque content changed.
pub const CONTENT: Channel = Channel::new(3);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(4);

/// Blend mode, filters, mask, replica or copy request changed.
pub const EFFECTS: Channel = Channel::new(5);
