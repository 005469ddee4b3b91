// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface identity.

use core::fmt;

/// An opaque, hashable reference to a surface.
///
/// The high 32 bits hold the allocating namespace (one per producer), the low
/// 32 bits a producer-local counter. Ids are compared as plain integers; the
/// split only matters for diagnostics and for
/// [`from_parts`](Self::from_parts).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// Builds an id from a namespace and a local counter.
    #[inline]
    #[must_use]
    pub const fn from_parts(namespace: u32, local: u32) -> Self {
        Self(((namespace as u64) << 32) | local as u64)
    }

    /// The allocating namespace.
    #[inline]
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "shifted down to exactly 32 bits"
    )]
    pub const fn namespace(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The namespace-local counter.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, reason = "masks the low 32 bits")]
    pub const fn local(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({}:{})", self.namespace(), self.local())
    }
}
