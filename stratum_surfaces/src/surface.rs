// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single producer's output slot.

use core::fmt;

use stratum_core::geometry::IntSize;
use stratum_core::surface_id::SurfaceId;
use stratum_render::{Frame, RenderPassId};

/// Errors from submitting a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueFrameError {
    /// No surface is registered under the id.
    UnknownSurface(SurfaceId),
    /// The frame's size differs from the surface's declared size.
    SizeMismatch {
        /// The surface's declared size.
        expected: IntSize,
        /// The submitted frame's size.
        actual: IntSize,
    },
    /// A quad references a shared quad state its pass does not hold.
    DanglingSharedQuadState {
        /// The pass holding the quad.
        pass: RenderPassId,
        /// Index of the quad within the pass.
        quad: usize,
    },
}

impl fmt::Display for QueueFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSurface(id) => write!(f, "no surface registered as {id:?}"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "frame size {actual:?} does not match surface size {expected:?}")
            }
            Self::DanglingSharedQuadState { pass, quad } => {
                write!(f, "quad {quad} of {pass:?} references a missing shared quad state")
            }
        }
    }
}

impl core::error::Error for QueueFrameError {}

/// Output slot of one producer.
///
/// Holds at most one frame. A successful [`queue_frame`](Self::queue_frame)
/// drops the previous one.
#[derive(Clone, Debug)]
pub struct Surface {
    id: SurfaceId,
    size: IntSize,
    current_frame: Option<Frame>,
}

impl Surface {
    /// Creates a surface with no frame.
    #[must_use]
    pub fn new(id: SurfaceId, size: IntSize) -> Self {
        Self {
            id,
            size,
            current_frame: None,
        }
    }

    /// The surface's id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// The declared size.
    #[inline]
    #[must_use]
    pub fn size(&self) -> IntSize {
        self.size
    }

    /// The latest accepted frame.
    #[inline]
    #[must_use]
    pub fn current_frame(&self) -> Option<&Frame> {
        self.current_frame.as_ref()
    }

    /// Replaces the current frame.
    ///
    /// A frame whose size differs from the declared size, or whose quads
    /// reference shared states their pass does not hold, is rejected and the
    /// previous frame stays current.
    pub fn queue_frame(&mut self, frame: Frame) -> Result<(), QueueFrameError> {
        if frame.size != self.size {
            return Err(QueueFrameError::SizeMismatch {
                expected: self.size,
                actual: frame.size,
            });
        }
        for pass in &frame.render_passes {
            let states = pass.shared_quad_states.len();
            if let Some(quad) = pass.quads.iter().position(|q| q.shared_quad_state >= states) {
                return Err(QueueFrameError::DanglingSharedQuadState {
                    pass: pass.id,
                    quad,
                });
            }
        }
        self.current_frame = Some(frame);
        Ok(())
    }

    /// Changes the declared size and drops the current frame.
    pub fn resize(&mut self, size: IntSize) {
        if size != self.size {
            self.size = size;
            self.current_frame = None;
        }
    }
}
