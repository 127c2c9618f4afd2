//! Walking a model's adjacency graph
//!
//! Each island whose bounds meet the swept volume is walked from the
//! polytope containing the start position, or the nearest one, with an
//! explicit work list. The walk only crosses faces that lie inside the
//! swept volume, and the volume shrinks to the earliest contact found so
//! far. Polytopes in range that the walk cannot reach through such faces
//! are picked up from the island's bounds tree and walked from in turn.

use std::collections::HashSet;

use super::sweep::{is_earlier, sweep_polytope, Crossing, LocalMotion, Sweep};
use crate::contents::ContentFlags;
use crate::model::CollisionModel;

/// First contact of a motion with one model, in model space
#[derive(Debug, Clone, Copy)]
pub(crate) struct ModelTrace {
    pub fraction: f32,
    pub contact: Option<(Crossing, ContentFlags)>,
    pub start_solid: bool,
    pub all_solid: bool,
    /// Polytopes actually swept
    pub swept: usize,
}

impl ModelTrace {
    const CLEAR: Self = Self {
        fraction: 1.0,
        contact: None,
        start_solid: false,
        all_solid: false,
        swept: 0,
    };
}

/// Sweep `motion` through `model`.
///
/// Polytope contents are masked by `entity_contents` before they are
/// tested against `mask`.
pub(crate) fn trace_model(
    model: &CollisionModel,
    entity_contents: ContentFlags,
    mask: ContentFlags,
    motion: &LocalMotion<'_>,
) -> ModelTrace {
    let direction = motion.delta();
    let fraction_epsilon = motion.fraction_epsilon();
    let polytopes = model.polytopes();

    let mut best = ModelTrace::CLEAR;
    let mut swept = motion.swept_bounds(1.0);
    let mut visited = HashSet::new();
    let mut work = Vec::new();

    for island in model.islands() {
        if !island.bounds().intersects(&swept) {
            continue;
        }
        let mut seed = island.tree().nearest(motion.start, |i| {
            polytopes[i].contains_point(model.planes(), motion.start, 0.0)
        });
        let mut cursor = island.tree().overlapping();

        loop {
            let next = match seed.take() {
                Some(index) => Some(index),
                None => cursor.next(&swept),
            };
            let Some(first) = next else {
                break;
            };
            if !visited.insert(first) {
                continue;
            }
            work.push(first);

            while let Some(index) = work.pop() {
                let polytope = &polytopes[index];
                if !polytope.bounds().intersects(&swept) {
                    continue;
                }
                for face in polytope.faces() {
                    if face.neighbors().is_empty() || !face.winding().bounds().intersects(&swept) {
                        continue;
                    }
                    for &neighbor in face.neighbors() {
                        if visited.insert(neighbor) {
                            work.push(neighbor);
                        }
                    }
                }

                let contents = polytope.contents() & entity_contents;
                if !contents.matches(mask) {
                    continue;
                }

                best.swept += 1;
                match sweep_polytope(model, polytope, motion) {
                    Sweep::Miss | Sweep::Sealed => {}
                    Sweep::StartSolid { all_solid, nearest } => {
                        return ModelTrace {
                            fraction: 0.0,
                            contact: Some((nearest, contents)),
                            start_solid: true,
                            all_solid,
                            swept: best.swept,
                        };
                    }
                    Sweep::Hit(crossing) => {
                        let earlier = match &best.contact {
                            None => true,
                            Some((current, _)) => is_earlier(&crossing, current, direction, fraction_epsilon),
                        };
                        if earlier {
                            best.fraction = crossing.fraction;
                            best.contact = Some((crossing, contents));
                            swept = motion.swept_bounds(crossing.fraction);
                        }
                    }
                }
            }
        }
    }
    best
}

/// Whether the shape at `motion.start` overlaps any matching polytope
pub(crate) fn overlaps_model(
    model: &CollisionModel,
    entity_contents: ContentFlags,
    mask: ContentFlags,
    motion: &LocalMotion<'_>,
) -> bool {
    let swept = motion.swept_bounds(0.0);
    model
        .islands()
        .iter()
        .filter(|island| island.bounds().intersects(&swept))
        .any(|island| {
            let mut cursor = island.tree().overlapping();
            while let Some(index) = cursor.next(&swept) {
                let polytope = &model.polytopes()[index];
                if (polytope.contents() & entity_contents).matches(mask)
                    && matches!(sweep_polytope(model, polytope, motion), Sweep::StartSolid { .. })
                {
                    return true;
                }
            }
            false
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionConfig;
    use crate::foundation::math::{Quat, Vec3};
    use crate::geometry::Plane;
    use crate::model::collision_model::tests::box_planes;
    use crate::model::CollisionModelBuilder;
    use crate::query::sweep::PlaneSource;
    use crate::trace_model::TraceModel;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-3;

    /// Floor made of two touching slabs plus a separate pillar
    fn floor() -> CollisionModel {
        let mut builder = CollisionModelBuilder::new("floor", CollisionConfig::default());
        builder
            .add_brush(ContentFlags::SOLID, &box_planes(Vec3::new(-8.0, -8.0, -1.0), Vec3::new(0.0, 8.0, 0.0)))
            .unwrap();
        builder
            .add_brush(ContentFlags::SOLID, &box_planes(Vec3::new(0.0, -8.0, -1.0), Vec3::new(8.0, 8.0, 0.0)))
            .unwrap();
        builder
            .add_brush(ContentFlags::WATER, &box_planes(Vec3::new(20.0, -1.0, 0.0), Vec3::new(22.0, 1.0, 4.0)))
            .unwrap();
        builder.build().unwrap()
    }

    fn motion(trace_model: &TraceModel, start: Vec3, end: Vec3) -> LocalMotion<'_> {
        LocalMotion::new(trace_model, Quat::identity(), start, end, EPSILON)
    }

    #[test]
    fn test_drop_onto_floor() {
        let model = floor();
        let shape = TraceModel::cuboid(Vec3::repeat(1.0)).unwrap();
        let result = trace_model(
            &model,
            ContentFlags::all(),
            ContentFlags::SOLID,
            &motion(&shape, Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -10.0)),
        );

        assert_relative_eq!(result.fraction, 0.45);
        let (crossing, contents) = result.contact.unwrap();
        assert_eq!(crossing.normal, Vec3::z());
        assert_eq!(contents, ContentFlags::SOLID);
        assert!(!result.start_solid);
    }

    #[test]
    fn test_grazing_an_inner_face_is_not_a_hit() {
        let model = floor();
        let ray = TraceModel::point();
        // starts within tolerance of the face shared by the two slabs
        let result = trace_model(
            &model,
            ContentFlags::all(),
            ContentFlags::SOLID,
            &motion(&ray, Vec3::new(-0.0005, 0.0, -0.5), Vec3::new(4.0, 0.0, -0.5)),
        );
        assert_eq!(result.fraction, 1.0);
        assert!(result.contact.is_none());
        assert!(!result.start_solid);
    }

    #[test]
    fn test_mask_filters_islands() {
        let model = floor();
        let ray = TraceModel::point();
        let through_pillar = motion(&ray, Vec3::new(18.0, 0.0, 2.0), Vec3::new(24.0, 0.0, 2.0));

        let solid = trace_model(&model, ContentFlags::all(), ContentFlags::SOLID, &through_pillar);
        assert_eq!(solid.fraction, 1.0);

        let water = trace_model(&model, ContentFlags::all(), ContentFlags::WATER, &through_pillar);
        assert_relative_eq!(water.fraction, 2.0 / 6.0);
        assert!(matches!(water.contact.unwrap().0.source, PlaneSource::Face(_)));

        let masked_entity = trace_model(&model, ContentFlags::SOLID, ContentFlags::WATER, &through_pillar);
        assert_eq!(masked_entity.fraction, 1.0);
    }

    #[test]
    fn test_start_inside_stops_the_walk() {
        let model = floor();
        let ray = TraceModel::point();
        let result = trace_model(
            &model,
            ContentFlags::all(),
            ContentFlags::SOLID,
            &motion(&ray, Vec3::new(4.0, 0.0, -0.4), Vec3::new(4.0, 0.0, 5.0)),
        );
        assert!(result.start_solid);
        assert!(!result.all_solid);
        assert_eq!(result.fraction, 0.0);
        assert_eq!(result.contact.unwrap().0.normal, Vec3::z());
    }

    #[test]
    fn test_overlap_agrees_with_stationary_trace() {
        let model = floor();
        let shape = TraceModel::sphere(0.5).unwrap();
        for z in [0.2_f32, 0.499, 0.4, 1.0, -3.0] {
            let still = motion(&shape, Vec3::new(2.0, 0.0, z), Vec3::new(2.0, 0.0, z));
            let overlap = overlaps_model(&model, ContentFlags::all(), ContentFlags::SOLID, &still);
            let trace = trace_model(&model, ContentFlags::all(), ContentFlags::SOLID, &still);
            assert_eq!(overlap, trace.start_solid, "z = {z}");
        }
        let inside = motion(&shape, Vec3::new(2.0, 0.0, 0.2), Vec3::new(2.0, 0.0, 0.2));
        assert!(overlaps_model(&model, ContentFlags::all(), ContentFlags::SOLID, &inside));
    }

    #[test]
    fn test_tie_prefers_steepest_normal() {
        let planes = vec![
            Plane::new(-Vec3::y(), 1.0).unwrap(),
            Plane::new(-Vec3::x(), 1.0).unwrap(),
            Plane::new(Vec3::x(), 1.0).unwrap(),
            Plane::new(Vec3::y(), 1.0).unwrap(),
            Plane::new(Vec3::z(), 1.0).unwrap(),
            Plane::new(-Vec3::z(), 1.0).unwrap(),
        ];
        let mut builder = CollisionModelBuilder::new("cube", CollisionConfig::default());
        builder.add_brush(ContentFlags::SOLID, &planes).unwrap();
        let model = builder.build().unwrap();

        // reaches the -x and -y faces at the same time; -x opposes the motion more
        let ray = TraceModel::point();
        let result = trace_model(
            &model,
            ContentFlags::all(),
            ContentFlags::SOLID,
            &motion(&ray, Vec3::new(-3.0, -2.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
        );
        assert_relative_eq!(result.fraction, 0.5);
        assert_eq!(result.contact.unwrap().0.normal, -Vec3::x());
    }

    /// Unit cubes in a row along x, each touching the next
    fn row(count: usize) -> CollisionModel {
        let mut builder = CollisionModelBuilder::new("row", CollisionConfig::default());
        for i in 0..count {
            let min = Vec3::new(i as f32, 0.0, 0.0);
            builder
                .add_brush(ContentFlags::SOLID, &box_planes(min, min + Vec3::repeat(1.0)))
                .unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_walk_stays_inside_the_swept_volume() {
        let model = row(32);
        assert_eq!(model.islands().len(), 1);
        let ray = TraceModel::point();

        let drop = trace_model(
            &model,
            ContentFlags::all(),
            ContentFlags::SOLID,
            &motion(&ray, Vec3::new(10.5, 0.5, 5.0), Vec3::new(10.5, 0.5, -5.0)),
        );
        assert_relative_eq!(drop.fraction, 0.4);
        assert_eq!(drop.contact.unwrap().0.normal, Vec3::z());
        assert_eq!(drop.swept, 1);

        // crossing three cubes along the top sweeps only those three
        let skim = trace_model(
            &model,
            ContentFlags::all(),
            ContentFlags::SOLID,
            &motion(&ray, Vec3::new(4.5, 0.5, 1.5), Vec3::new(6.5, 0.5, 0.5)),
        );
        assert!(skim.contact.is_some());
        assert!(skim.swept <= 3, "swept {}", skim.swept);
    }

    #[test]
    fn test_reaches_polytopes_the_seed_does_not_border() {
        let mut builder = CollisionModelBuilder::new("room", CollisionConfig::default());
        builder
            .add_brush(ContentFlags::SOLID, &box_planes(Vec3::new(-10.0, -10.0, -1.0), Vec3::new(10.0, 10.0, 0.0)))
            .unwrap();
        builder
            .add_brush(ContentFlags::SOLID, &box_planes(Vec3::new(9.0, -10.0, 0.0), Vec3::new(10.0, 10.0, 5.0)))
            .unwrap();
        let model = builder.build().unwrap();
        assert_eq!(model.islands().len(), 1);

        // the floor is nearest to the start, the wall is what gets hit
        let ray = TraceModel::point();
        let result = trace_model(
            &model,
            ContentFlags::all(),
            ContentFlags::SOLID,
            &motion(&ray, Vec3::new(0.0, 0.0, 0.5), Vec3::new(20.0, 0.0, 0.5)),
        );
        assert_relative_eq!(result.fraction, 0.45);
        assert_eq!(result.contact.unwrap().0.normal, -Vec3::x());
        assert_eq!(result.swept, 1);
    }

    #[test]
    fn test_water_beside_solid_does_not_hide_it() {
        let mut builder = CollisionModelBuilder::new("pool", CollisionConfig::default());
        builder
            .add_brush(ContentFlags::WATER, &box_planes(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(0.0, 1.0, 1.0)))
            .unwrap();
        builder
            .add_brush(ContentFlags::SOLID, &box_planes(Vec3::new(0.0, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0)))
            .unwrap();
        let model = builder.build().unwrap();
        let ray = TraceModel::point();
        let across = motion(&ray, Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));

        let solid = trace_model(&model, ContentFlags::all(), ContentFlags::SOLID, &across);
        assert_relative_eq!(solid.fraction, 0.5);
        let (crossing, contents) = solid.contact.unwrap();
        assert_eq!(crossing.normal, -Vec3::x());
        assert_eq!(contents, ContentFlags::SOLID);

        let water = trace_model(&model, ContentFlags::all(), ContentFlags::WATER, &across);
        assert_relative_eq!(water.fraction, 0.3);
    }
}
