//! Brute-force convex hull validation for small point sets
//!
//! Trace hulls are tiny (a few dozen points at most), so every point
//! triple is tried as a candidate face. A triple whose plane has every
//! point on or behind it is a hull face.

use super::InvalidShapeError;
use crate::foundation::math::Vec3;
use crate::geometry::{Plane, PlaneSide};

const HULL_EPSILON: f32 = 1e-3;

/// Outward planes of the convex hull of `points`.
///
/// Fails when the points are flat (no enclosed volume) or when some point
/// is not a vertex of the hull, i.e. the set does not describe a convex
/// polyhedron by its corners.
pub(crate) fn hull_planes(points: &[Vec3]) -> Result<Vec<Plane>, InvalidShapeError> {
    let mut planes: Vec<Plane> = Vec::new();
    let count = points.len();

    for i in 0..count {
        for j in i + 1..count {
            for k in j + 1..count {
                let Ok(plane) = Plane::from_points(points[i], points[j], points[k]) else {
                    continue;
                };
                for candidate in [plane, plane.flipped()] {
                    let supporting = points
                        .iter()
                        .all(|&p| candidate.side(p, HULL_EPSILON) != PlaneSide::Front);
                    let has_interior = points
                        .iter()
                        .any(|&p| candidate.side(p, HULL_EPSILON) == PlaneSide::Back);
                    if supporting
                        && has_interior
                        && !planes.iter().any(|p| p.approx_eq(&candidate, 1e-4, HULL_EPSILON))
                    {
                        planes.push(candidate);
                    }
                }
            }
        }
    }

    if planes.len() < 4 {
        return Err(InvalidShapeError::FlatHull);
    }

    // a corner touches at least three hull planes with independent normals
    for (index, &point) in points.iter().enumerate() {
        let touching: Vec<Vec3> = planes
            .iter()
            .filter(|plane| plane.side(point, HULL_EPSILON) == PlaneSide::On)
            .map(Plane::normal)
            .collect();
        if !spans_space(&touching) {
            return Err(InvalidShapeError::NonConvexHull { index });
        }
    }

    Ok(planes)
}

fn spans_space(normals: &[Vec3]) -> bool {
    let count = normals.len();
    (0..count).any(|a| {
        (a + 1..count).any(|b| {
            (b + 1..count).any(|c| normals[a].cross(&normals[b]).dot(&normals[c]).abs() > 1e-3)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_tetrahedron_has_four_planes() {
        let planes = hull_planes(&tetrahedron()).unwrap();
        assert_eq!(planes.len(), 4);
        for plane in &planes {
            for &p in &tetrahedron() {
                assert!(plane.distance(p) <= HULL_EPSILON);
            }
        }
    }

    #[test]
    fn test_interior_point_is_rejected() {
        let mut points = tetrahedron();
        points.push(Vec3::new(0.1, 0.1, 0.1));
        assert_eq!(hull_planes(&points), Err(InvalidShapeError::NonConvexHull { index: 4 }));
    }

    #[test]
    fn test_flat_points_are_rejected() {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(hull_planes(&points), Err(InvalidShapeError::FlatHull));
    }
}
