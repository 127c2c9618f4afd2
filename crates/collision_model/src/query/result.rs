//! Trace requests and results

use crate::contents::ContentFlags;
use crate::foundation::math::Vec3;
use crate::geometry::Plane;
use crate::trace_model::TraceModel;
use crate::world::EntityHandle;

/// Where and against what a trace stopped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// World-space point of first contact on the moving shape
    pub point: Vec3,
    /// World-space normal of the surface that was hit
    pub normal: Vec3,
    /// World-space plane of the surface that was hit
    pub plane: Plane,
    /// Contents of the polytope that was hit
    pub contents: ContentFlags,
    /// Entity that was hit
    pub entity: EntityHandle,
}

/// Outcome of sweeping a trace model through the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    /// Fraction of the motion completed, 1.0 when nothing was hit
    pub fraction: f32,
    /// Position of the trace model origin at `fraction`
    pub end_position: Vec3,
    /// The surface that stopped the motion.
    ///
    /// For a start-solid result this is the face closest to the start
    /// position of the entity the shape is stuck in.
    pub contact: Option<Contact>,
    /// The start position is inside a solid
    pub start_solid: bool,
    /// The whole motion is inside a solid
    pub all_solid: bool,
}

impl TraceResult {
    /// Unobstructed motion
    pub fn clear(end: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end_position: end,
            contact: None,
            start_solid: false,
            all_solid: false,
        }
    }

    /// Whether anything stopped or contained the motion
    pub fn is_hit(&self) -> bool {
        self.start_solid || self.fraction < 1.0
    }

    /// Entity that was hit, if any
    pub fn entity(&self) -> Option<EntityHandle> {
        self.contact.map(|c| c.entity)
    }
}

/// One trace of a batch
#[derive(Debug, Clone, Copy)]
pub struct TraceRequest<'a> {
    /// Moving shape, axis aligned in world space
    pub trace_model: &'a TraceModel,
    /// World-space start of the shape origin
    pub start: Vec3,
    /// World-space end of the shape origin
    pub end: Vec3,
    /// Contents to collide with
    pub mask: ContentFlags,
}

impl<'a> TraceRequest<'a> {
    /// Create a request
    pub fn new(trace_model: &'a TraceModel, start: Vec3, end: Vec3, mask: ContentFlags) -> Self {
        Self {
            trace_model,
            start,
            end,
            mask,
        }
    }
}
