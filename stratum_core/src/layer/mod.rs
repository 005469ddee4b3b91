// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! A *layer* is a node in a compositing tree. Each layer has:
//!
//! - An identity ([`LayerId`]): a generational handle that becomes stale when
//!   the layer is destroyed, preventing use-after-free bugs at the API level.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//!   Later siblings draw on top of earlier ones.
//! - **Local properties** set by the caller: [`transform`](LayerStore::set_transform),
//!   [`opacity`](LayerStore::set_opacity), [`clip`](LayerStore::set_clip),
//!   [`bounds`](LayerStore::set_bounds), opaque content,
//!   [`flags`](LayerStore::set_flags) and [`effects`](LayerStore::set_effects).
//! - **Draw properties** produced by [`evaluate`](LayerStore::evaluate): the
//!   layer's render target, its draw transform into that target, its
//!   screen-space transform, draw opacity, clip rect and visible content rect.
//!
//! Layers that need an offscreen pass (roots, masks, replicas, filters,
//! non-normal blending, copy requests, group opacity) own a [`RenderSurface`].
//! A surface's space is its owning layer's local space.
//!
//! # Dirty tracking
//!
//! Property mutations automatically mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)):
//!
//! - **TRANSFORM** / **OPACITY**: propagate to all descendants.
//! - **CLIP** / **CONTENT** / **EFFECTS**: local-only.
//! - **TOPOLOGY**: structural changes that trigger a traversal-order
//!   rebuild.

mod draw;
mod evaluate;
mod id;
mod store;
mod surface;
mod traverse;

pub use evaluate::FrameChanges;
pub use id::{INVALID, LayerId};
pub use store::{LayerEffects, LayerFlags, LayerStore, Replica};
pub use surface::RenderSurface;
pub use traverse::Children;
