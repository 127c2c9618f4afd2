//! Trace and position queries
//!
//! Queries run against one placed model at a time: the motion is moved
//! into the model's local space, swept through its polytopes by walking
//! the adjacency graph, and the first contact is moved back into world
//! space. The world combines the per-entity results.

mod result;
pub(crate) mod sweep;
pub(crate) mod walk;

pub use result::{Contact, TraceRequest, TraceResult};

use crate::contents::ContentFlags;
use crate::foundation::logging::trace;
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::Plane;
use crate::model::CollisionModel;
use crate::trace_model::TraceModel;
use crate::world::EntityHandle;

use sweep::LocalMotion;

/// A model placed in the world, as seen by one query
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placement<'a> {
    pub model: &'a CollisionModel,
    pub transform: &'a Transform,
    pub contents: ContentFlags,
    pub entity: EntityHandle,
}

impl Placement<'_> {
    fn local_motion<'t>(&self, trace_model: &'t TraceModel, start: Vec3, end: Vec3, epsilon: f32) -> LocalMotion<'t> {
        LocalMotion::new(
            trace_model,
            self.transform.rotation,
            self.transform.inverse_transform_point(start),
            self.transform.inverse_transform_point(end),
            epsilon,
        )
    }

    /// Sweep a request through this placement
    pub fn trace(&self, request: &TraceRequest<'_>, epsilon: f32) -> TraceResult {
        let motion = self.local_motion(request.trace_model, request.start, request.end, epsilon);
        let local = walk::trace_model(self.model, self.contents, request.mask, &motion);
        trace!("Trace through {}: swept {} polytopes", self.model.name(), local.swept);

        let Some((crossing, contents)) = local.contact else {
            return TraceResult::clear(request.end);
        };

        let end_position = request.start + (request.end - request.start) * local.fraction;
        let normal = self.transform.transform_vector(crossing.normal);
        let contact = Plane::from_normal(normal, crossing.dist + normal.dot(&self.transform.position))
            .ok()
            .map(|plane| Contact {
                point: end_position + request.trace_model.support_point(-plane.normal()),
                normal: plane.normal(),
                plane,
                contents,
                entity: self.entity,
            });

        TraceResult {
            fraction: local.fraction,
            end_position,
            contact,
            start_solid: local.start_solid,
            all_solid: local.all_solid,
        }
    }

    /// Whether the trace model at `origin` overlaps this placement
    pub fn overlaps(&self, trace_model: &TraceModel, origin: Vec3, mask: ContentFlags, epsilon: f32) -> bool {
        let motion = self.local_motion(trace_model, origin, origin, epsilon);
        walk::overlaps_model(self.model, self.contents, mask, &motion)
    }
}

/// Keep whichever of two results stops the motion first.
///
/// Ties within `fraction_epsilon` go to the contact whose normal opposes
/// `direction` most. Solid flags accumulate.
pub(crate) fn merge_results(
    best: TraceResult,
    candidate: TraceResult,
    direction: Vec3,
    fraction_epsilon: f32,
) -> TraceResult {
    let start_solid = best.start_solid || candidate.start_solid;
    let all_solid = best.all_solid || candidate.all_solid;

    let steeper = |a: &TraceResult, b: &TraceResult| match (a.contact, b.contact) {
        (Some(a), Some(b)) => a.normal.dot(&direction) < b.normal.dot(&direction),
        (Some(_), None) => true,
        _ => false,
    };

    let take_candidate = if candidate.fraction < best.fraction - fraction_epsilon {
        true
    } else if (candidate.fraction - best.fraction).abs() <= fraction_epsilon {
        candidate.is_hit() && (!best.is_hit() || steeper(&candidate, &best))
    } else {
        false
    };

    let winner = if take_candidate { candidate } else { best };
    TraceResult {
        start_solid,
        all_solid,
        ..winner
    }
}
