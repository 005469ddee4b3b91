// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The surface registry.

use core::fmt;

use hashbrown::HashMap;
use stratum_core::geometry::IntSize;
use stratum_core::surface_id::SurfaceId;
use stratum_render::Frame;

use crate::surface::{QueueFrameError, Surface};

/// Errors from registering a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterError {
    /// Another surface already uses the id.
    AlreadyRegistered(SurfaceId),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered(id) => write!(f, "surface {id:?} is already registered"),
        }
    }
}

impl core::error::Error for RegisterError {}

/// Maps surface ids to surfaces.
///
/// The manager owns registered surfaces. Removing one with
/// [`unregister_surface`](Self::unregister_surface) hands it back, after
/// which lookups by its id fail and references to it aggregate to nothing.
///
/// Not internally synchronized. Registration changes must not interleave
/// with an aggregation in progress; the borrow a
/// [`SurfaceAggregator`](crate::SurfaceAggregator) holds enforces that.
#[derive(Debug, Default)]
pub struct SurfaceManager {
    namespace: u32,
    next_local: u32,
    surfaces: HashMap<SurfaceId, Surface>,
}

impl SurfaceManager {
    /// Creates an empty registry allocating ids in namespace 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry allocating ids in `namespace`.
    #[must_use]
    pub fn with_namespace(namespace: u32) -> Self {
        Self {
            namespace,
            ..Self::default()
        }
    }

    /// Returns a fresh id that is not currently registered.
    pub fn allocate_surface_id(&mut self) -> SurfaceId {
        loop {
            self.next_local = self.next_local.wrapping_add(1);
            let id = SurfaceId::from_parts(self.namespace, self.next_local);
            if !self.surfaces.contains_key(&id) {
                return id;
            }
        }
    }

    /// Registers `surface` under its own id.
    pub fn register_surface(&mut self, surface: Surface) -> Result<SurfaceId, RegisterError> {
        let id = surface.id();
        if self.surfaces.contains_key(&id) {
            return Err(RegisterError::AlreadyRegistered(id));
        }
        self.surfaces.insert(id, surface);
        Ok(id)
    }

    /// Allocates an id, registers a frameless surface of `size` under it, and
    /// returns the id.
    pub fn create_surface(&mut self, size: IntSize) -> SurfaceId {
        let id = self.allocate_surface_id();
        self.surfaces.insert(id, Surface::new(id, size));
        id
    }

    /// Looks up a surface.
    #[inline]
    #[must_use]
    pub fn lookup(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    /// Looks up a surface for mutation.
    #[inline]
    pub fn lookup_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(&id)
    }

    /// Removes a surface and returns it.
    pub fn unregister_surface(&mut self, id: SurfaceId) -> Option<Surface> {
        self.surfaces.remove(&id)
    }

    /// Submits a frame to a registered surface.
    pub fn queue_frame(&mut self, id: SurfaceId, frame: Frame) -> Result<(), QueueFrameError> {
        self.surfaces
            .get_mut(&id)
            .ok_or(QueueFrameError::UnknownSurface(id))?
            .queue_frame(frame)
    }

    /// Number of registered surfaces.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_lookup_unregister() {
        let mut manager = SurfaceManager::new();
        let id = SurfaceId::from_parts(3, 1);
        let registered = manager
            .register_surface(Surface::new(id, IntSize::new(4, 4)))
            .expect("fresh id");
        assert_eq!(registered, id);
        assert_eq!(manager.lookup(id).map(Surface::size), Some(IntSize::new(4, 4)));

        let removed = manager.unregister_surface(id);
        assert!(removed.is_some(), "unregister hands the surface back");
        assert!(manager.lookup(id).is_none(), "lookups fail after unregister");
        assert!(manager.is_empty(), "registry is empty again");
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut manager = SurfaceManager::new();
        let id = SurfaceId(7);
        manager
            .register_surface(Surface::new(id, IntSize::new(1, 1)))
            .expect("fresh id");
        let err = manager
            .register_surface(Surface::new(id, IntSize::new(2, 2)))
            .expect_err("id taken");
        assert_eq!(err, RegisterError::AlreadyRegistered(id));
        assert_eq!(manager.lookup(id).map(Surface::size), Some(IntSize::new(1, 1)));
    }

    #[test]
    fn allocated_ids_skip_registered_ones() {
        let mut manager = SurfaceManager::with_namespace(2);
        manager
            .register_surface(Surface::new(SurfaceId::from_parts(2, 1), IntSize::ZERO))
            .expect("fresh id");
        let id = manager.allocate_surface_id();
        assert_eq!(id, SurfaceId::from_parts(2, 2));
        let created = manager.create_surface(IntSize::new(3, 3));
        assert_ne!(created, id);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn queue_frame_routes_to_surface() {
        let mut manager = SurfaceManager::new();
        let id = manager.create_surface(IntSize::new(8, 8));
        manager
            .queue_frame(id, Frame::new(IntSize::new(8, 8)))
            .expect("sizes match");
        assert!(
            manager.lookup(id).and_then(Surface::current_frame).is_some(),
            "frame was stored"
        );
        assert_eq!(
            manager.queue_frame(SurfaceId(999), Frame::default()),
            Err(QueueFrameError::UnknownSurface(SurfaceId(999)))
        );
    }
}
