// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversal positions.

/// What a traversal step stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visit {
    /// The layer's own content, drawn into `target`.
    Itself,
    /// The layer's render surface, after all of its contents were visited.
    /// `target` is the layer itself.
    TargetSurface,
    /// The layer's render surface as content of the target it draws into.
    /// `target` is that parent target.
    ContributingSurface,
}

/// One step of a front-to-back traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerIteratorPosition<Id> {
    /// The layer being visited.
    pub current_layer: Id,
    /// The render target the step happens in (see [`Visit`]).
    pub target: Id,
    /// What the step stands for.
    pub visit: Visit,
}

impl<Id> LayerIteratorPosition<Id> {
    /// The layer's own content.
    #[inline]
    #[must_use]
    pub const fn itself(current_layer: Id, target: Id) -> Self {
        Self {
            current_layer,
            target,
            visit: Visit::Itself,
        }
    }

    /// The layer's finished surface.
    #[inline]
    #[must_use]
    pub const fn target_surface(current_layer: Id) -> Self
    where
        Id: Copy,
    {
        Self {
            current_layer,
            target: current_layer,
            visit: Visit::TargetSurface,
        }
    }

    /// The layer's surface contributing into `target`.
    #[inline]
    #[must_use]
    pub const fn contributing_surface(current_layer: Id, target: Id) -> Self {
        Self {
            current_layer,
            target,
            visit: Visit::ContributingSurface,
        }
    }
}
