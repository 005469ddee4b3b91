// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque keys for producer-owned resources.

use core::fmt;

/// An opaque handle to a resource (texture, buffer, etc.) owned by a frame
/// producer.
///
/// Keys pass through aggregation without interpretation; only the renderer
/// that finally consumes the frame resolves them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.0)
    }
}
