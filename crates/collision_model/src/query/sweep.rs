//! Sweeping a trace model against one convex polytope
//!
//! Every boundary plane of the polytope is pushed out by the extent of
//! the trace model along its normal, which reduces the shape sweep to a
//! point sweep through the expanded solid. The motion enters the solid
//! at the latest entering crossing and leaves it at the earliest leaving
//! one; it hits only when it enters before it leaves.

use crate::foundation::math::{is_identity_rotation, Quat, Vec3};
use crate::geometry::Bounds;
use crate::model::{CollisionModel, Polytope};
use crate::trace_model::{TraceModel, TraceShape};

/// A trace expressed in the local space of one placed model
#[derive(Debug, Clone)]
pub(crate) struct LocalMotion<'a> {
    pub trace_model: &'a TraceModel,
    /// Local to world rotation of the placement
    pub rotation: Quat,
    pub start: Vec3,
    pub end: Vec3,
    pub epsilon: f32,
    /// Separating directions contributed by the shape itself (local space)
    shape_axes: Vec<Vec3>,
    shape_bounds: Bounds,
}

impl<'a> LocalMotion<'a> {
    pub fn new(trace_model: &'a TraceModel, rotation: Quat, start: Vec3, end: Vec3, epsilon: f32) -> Self {
        let inverse = rotation.inverse();
        let shape_axes = match trace_model.shape() {
            TraceShape::Box { .. } if !is_identity_rotation(&rotation) => {
                let mut axes = Vec::with_capacity(6);
                for axis in [Vec3::x(), Vec3::y(), Vec3::z()] {
                    axes.push(inverse * axis);
                    axes.push(-(inverse * axis));
                }
                axes
            }
            TraceShape::Hull { .. } => trace_model
                .hull_planes()
                .iter()
                .map(|plane| inverse * -plane.normal())
                .collect(),
            _ => Vec::new(),
        };

        let mut min = Vec3::zeros();
        let mut max = Vec3::zeros();
        for axis in 0..3 {
            let mut local = Vec3::zeros();
            local[axis] = 1.0;
            let world = rotation * local;
            max[axis] = trace_model.extent_along(world);
            min[axis] = -trace_model.extent_along(-world);
        }

        Self {
            trace_model,
            rotation,
            start,
            end,
            epsilon,
            shape_axes,
            shape_bounds: Bounds { min, max },
        }
    }

    pub fn delta(&self) -> Vec3 {
        self.end - self.start
    }

    /// Fraction tolerance equivalent to `epsilon` along the motion
    pub fn fraction_epsilon(&self) -> f32 {
        let length = self.delta().norm();
        if length > f32::EPSILON {
            self.epsilon / length
        } else {
            0.0
        }
    }

    /// Local bounds of the shape swept from the start to `fraction`
    pub fn swept_bounds(&self, fraction: f32) -> Bounds {
        let end = self.start + self.delta() * fraction;
        self.shape_bounds
            .translated(self.start)
            .union(&self.shape_bounds.translated(end))
            .expanded(self.epsilon * 2.0)
    }

    /// How far the plane moves out to account for the shape
    fn offset(&self, local_normal: Vec3) -> f32 {
        let normal = self.rotation * local_normal;
        normal.dot(&self.trace_model.support_point(-normal))
    }
}

/// Which plane of the polytope a crossing happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaneSource {
    Face(usize),
    Bevel,
    ShapeAxis,
}

/// A motion crossing one (unexpanded) local plane
#[derive(Debug, Clone, Copy)]
pub(crate) struct Crossing {
    pub fraction: f32,
    pub normal: Vec3,
    pub dist: f32,
    pub source: PlaneSource,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Sweep {
    Miss,
    /// Entered through a face that a neighbor covers
    Sealed,
    Hit(Crossing),
    StartSolid { all_solid: bool, nearest: Crossing },
}

/// Whether `candidate` should replace `current` as the first contact
pub(crate) fn is_earlier(candidate: &Crossing, current: &Crossing, direction: Vec3, fraction_epsilon: f32) -> bool {
    if candidate.fraction < current.fraction - fraction_epsilon {
        return true;
    }
    (candidate.fraction - current.fraction).abs() <= fraction_epsilon
        && candidate.normal.dot(&direction) < current.normal.dot(&direction)
}

struct Clip {
    start_out: bool,
    end_out: bool,
    enter: Option<Crossing>,
    leave: f32,
    shallowest: Option<(f32, Crossing)>,
    direction: Vec3,
    fraction_epsilon: f32,
}

impl Clip {
    /// Returns false once the motion is known to stay outside
    fn visit(&mut self, motion: &LocalMotion<'_>, normal: Vec3, dist: f32, source: PlaneSource) -> bool {
        let eps = motion.epsilon;
        let expanded = dist - motion.offset(normal);
        let d1 = normal.dot(&motion.start) - expanded;
        let d2 = normal.dot(&motion.end) - expanded;

        if d1 >= -eps {
            self.start_out = true;
        }
        if d2 >= -eps {
            self.end_out = true;
        }
        if d1 >= -eps && d2 >= -eps {
            return false;
        }
        if d1 < -eps && self.shallowest.map_or(true, |(depth, _)| d1 > depth) {
            let nearest = Crossing {
                fraction: 0.0,
                normal,
                dist,
                source,
            };
            self.shallowest = Some((d1, nearest));
        }
        if d1 < -eps && d2 < -eps {
            return true;
        }

        let fraction = (d1 / (d1 - d2)).clamp(0.0, 1.0);
        if d1 > d2 {
            let crossing = Crossing {
                fraction,
                normal,
                dist,
                source,
            };
            let replace = match &self.enter {
                None => true,
                Some(current) => {
                    crossing.fraction > current.fraction + self.fraction_epsilon
                        || ((crossing.fraction - current.fraction).abs() <= self.fraction_epsilon
                            && crossing.normal.dot(&self.direction) < current.normal.dot(&self.direction))
                }
            };
            if replace {
                self.enter = Some(crossing);
            }
        } else if fraction < self.leave {
            self.leave = fraction;
        }
        true
    }
}

/// Sweep the motion against one polytope of `model`
pub(crate) fn sweep_polytope(model: &CollisionModel, polytope: &Polytope, motion: &LocalMotion<'_>) -> Sweep {
    let mut clip = Clip {
        start_out: false,
        end_out: false,
        enter: None,
        leave: 1.0,
        shallowest: None,
        direction: motion.delta(),
        fraction_epsilon: motion.fraction_epsilon(),
    };

    for (index, face) in polytope.faces().iter().enumerate() {
        let plane = model.plane(face.plane());
        if !clip.visit(motion, plane.normal(), plane.dist(), PlaneSource::Face(index)) {
            return Sweep::Miss;
        }
    }
    for &bevel in polytope.bevels() {
        let plane = model.plane(bevel);
        if !clip.visit(motion, plane.normal(), plane.dist(), PlaneSource::Bevel) {
            return Sweep::Miss;
        }
    }
    for &axis in &motion.shape_axes {
        let dist = polytope
            .vertices()
            .iter()
            .map(|v| axis.dot(v))
            .fold(f32::NEG_INFINITY, f32::max);
        if !clip.visit(motion, axis, dist, PlaneSource::ShapeAxis) {
            return Sweep::Miss;
        }
    }

    if !clip.start_out {
        return match clip.shallowest {
            Some((_, nearest)) => Sweep::StartSolid {
                all_solid: !clip.end_out,
                nearest,
            },
            None => Sweep::Miss,
        };
    }

    match clip.enter {
        Some(enter) if enter.fraction < clip.leave => match enter.source {
            PlaneSource::Face(index) if polytope.faces()[index].is_sealed() => Sweep::Sealed,
            _ => Sweep::Hit(enter),
        },
        _ => Sweep::Miss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionConfig;
    use crate::contents::ContentFlags;
    use crate::model::collision_model::tests::box_planes;
    use crate::model::CollisionModelBuilder;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-3;

    fn unit_cube() -> CollisionModel {
        let mut builder = CollisionModelBuilder::new("cube", CollisionConfig::default());
        builder
            .add_brush(ContentFlags::SOLID, &box_planes(Vec3::repeat(-1.0), Vec3::repeat(1.0)))
            .unwrap();
        builder.build().unwrap()
    }

    fn sweep(model: &CollisionModel, trace_model: &TraceModel, start: Vec3, end: Vec3) -> Sweep {
        let motion = LocalMotion::new(trace_model, Quat::identity(), start, end, EPSILON);
        sweep_polytope(model, &model.polytopes()[0], &motion)
    }

    #[test]
    fn test_point_hits_near_face() {
        let model = unit_cube();
        let Sweep::Hit(hit) = sweep(&model, &TraceModel::point(), Vec3::new(-3.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0))
        else {
            panic!("expected a hit");
        };
        assert_relative_eq!(hit.fraction, 0.5);
        assert_eq!(hit.normal, -Vec3::x());
        assert_eq!(hit.dist, 1.0);
    }

    #[test]
    fn test_box_is_pushed_out_by_its_extent() {
        let model = unit_cube();
        let shape = TraceModel::cuboid(Vec3::repeat(0.5)).unwrap();
        let Sweep::Hit(hit) = sweep(&model, &shape, Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 0.0, 0.0)) else {
            panic!("expected a hit");
        };
        assert_relative_eq!(hit.fraction, 2.5 / 4.0);
        assert_eq!(hit.normal, Vec3::z());
    }

    #[test]
    fn test_sliding_along_a_face_is_not_a_hit() {
        let model = unit_cube();
        let shape = TraceModel::cuboid(Vec3::repeat(0.5)).unwrap();
        let outcome = sweep(&model, &shape, Vec3::new(-4.0, 0.0, 1.5), Vec3::new(4.0, 0.0, 1.5));
        assert!(matches!(outcome, Sweep::Miss));
    }

    #[test]
    fn test_moving_away_is_not_a_hit() {
        let model = unit_cube();
        let outcome = sweep(&model, &TraceModel::point(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));
        assert!(matches!(outcome, Sweep::Miss));
    }

    #[test]
    fn test_passing_beside_is_not_a_hit() {
        let model = unit_cube();
        let outcome = sweep(&model, &TraceModel::point(), Vec3::new(-3.0, 2.0, 0.0), Vec3::new(3.0, 2.0, 0.0));
        assert!(matches!(outcome, Sweep::Miss));
    }

    #[test]
    fn test_start_inside_reports_nearest_face() {
        let model = unit_cube();
        let Sweep::StartSolid { all_solid, nearest } =
            sweep(&model, &TraceModel::point(), Vec3::new(0.0, 0.8, 0.0), Vec3::new(0.0, 5.0, 0.0))
        else {
            panic!("expected start solid");
        };
        assert!(!all_solid);
        assert_eq!(nearest.normal, Vec3::y());

        let outcome = sweep(&model, &TraceModel::point(), Vec3::zeros(), Vec3::new(0.5, 0.0, 0.0));
        assert!(matches!(outcome, Sweep::StartSolid { all_solid: true, .. }));
    }

    #[test]
    fn test_rotated_box_uses_its_own_axes() {
        let model = unit_cube();
        let shape = TraceModel::cuboid(Vec3::repeat(0.5)).unwrap();
        // shape turned 45 degrees relative to the cube; diagonal reach is 0.5 * sqrt(2)
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let motion = LocalMotion::new(&shape, rotation, Vec3::new(-4.0, 0.0, 0.0), Vec3::zeros(), EPSILON);
        let Sweep::Hit(hit) = sweep_polytope(&model, &model.polytopes()[0], &motion) else {
            panic!("expected a hit");
        };
        assert_relative_eq!(hit.fraction, (3.0 - 0.5 * 2.0_f32.sqrt()) / 4.0, epsilon = 1e-4);
        assert_eq!(hit.normal, -Vec3::x());
    }

    #[test]
    fn test_box_axes_only_for_real_rotations() {
        let shape = TraceModel::cuboid(Vec3::repeat(0.5)).unwrap();
        let turn = Quat::from_axis_angle(&Vec3::z_axis(), 0.7);

        let undone = LocalMotion::new(&shape, turn * turn.inverse(), Vec3::zeros(), Vec3::x(), EPSILON);
        assert!(undone.shape_axes.is_empty());

        let turned = LocalMotion::new(&shape, turn, Vec3::zeros(), Vec3::x(), EPSILON);
        assert_eq!(turned.shape_axes.len(), 6);
    }
}
