//! Convex planar polygons
//!
//! Windings are the face representation of polytopes. They are built by
//! clipping a huge square lying on a plane against every other plane of
//! the solid, which is why clipping is the central operation here.

use super::{Bounds, GeometryError, Plane, PlaneSide};
use crate::foundation::math::Vec3;

/// A convex polygon, counter-clockwise when viewed from the front
#[derive(Debug, Clone, PartialEq)]
pub struct Winding {
    points: Vec<Vec3>,
}

impl Winding {
    /// Create a winding from at least three finite points
    pub fn new(points: Vec<Vec3>) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        if !points.iter().flat_map(|p| p.iter()).all(|c| c.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        Ok(Self { points })
    }

    /// A square of the given half size lying on `plane`, centered on the
    /// point of the plane closest to the origin.
    pub fn base_for_plane(plane: &Plane, half_size: f32) -> Self {
        let normal = plane.normal();

        // pick the world axis least aligned with the normal as "up"
        let major = (0..3)
            .max_by(|&a, &b| normal[a].abs().total_cmp(&normal[b].abs()))
            .unwrap_or(2);
        let up = if major == 2 { Vec3::x() } else { Vec3::z() };
        let up = (up - normal * up.dot(&normal)).normalize() * half_size;
        let right = normal.cross(&up);
        let origin = normal * plane.dist();

        Self {
            points: vec![
                origin - right + up,
                origin + right + up,
                origin + right - up,
                origin - right - up,
            ],
        }
    }

    /// The polygon's vertices in order
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Windings always hold at least three points
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the edges as `(start, end)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.points
            .iter()
            .zip(self.points.iter().cycle().skip(1))
            .map(|(&a, &b)| (a, b))
    }

    /// Area-weighted normal (twice the area times the unit normal)
    fn area_vector(&self) -> Vec3 {
        let origin = self.points[0];
        self.points
            .windows(2)
            .skip(1)
            .fold(Vec3::zeros(), |acc, pair| {
                acc + (pair[0] - origin).cross(&(pair[1] - origin))
            })
    }

    /// Polygon area
    pub fn area(&self) -> f32 {
        self.area_vector().norm() * 0.5
    }

    /// Average of the vertices
    pub fn center(&self) -> Vec3 {
        #[allow(clippy::cast_precision_loss)]
        let count = self.points.len() as f32;
        self.points.iter().sum::<Vec3>() / count
    }

    /// Bounds of the vertices
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.points)
    }

    /// Plane the winding lies on, oriented by its winding order
    pub fn plane(&self) -> Result<Plane, GeometryError> {
        Plane::from_point_normal(self.center(), self.area_vector())
    }

    /// Whether the polygon is convex and planar within `epsilon`
    pub fn is_convex(&self, epsilon: f32) -> bool {
        let Ok(plane) = self.plane() else {
            return false;
        };
        if self.points.iter().any(|&p| plane.side(p, epsilon) != PlaneSide::On) {
            return false;
        }
        let normal = plane.normal();
        self.edges().all(|(a, b)| {
            let Ok(edge_plane) = Plane::from_point_normal(a, (b - a).cross(&normal)) else {
                return false;
            };
            self.points.iter().all(|&p| edge_plane.side(p, epsilon) != PlaneSide::Front)
        })
    }

    /// Keep the part of the winding in front of `plane`.
    ///
    /// Points within `epsilon` of the plane are kept on the boundary.
    /// Returns `None` when no point lies strictly in front.
    pub fn clip(&self, plane: &Plane, epsilon: f32) -> Option<Winding> {
        let distances: Vec<f32> = self.points.iter().map(|&p| plane.distance(p)).collect();
        let sides: Vec<PlaneSide> = distances
            .iter()
            .map(|&d| {
                if d > epsilon {
                    PlaneSide::Front
                } else if d < -epsilon {
                    PlaneSide::Back
                } else {
                    PlaneSide::On
                }
            })
            .collect();

        if !sides.contains(&PlaneSide::Front) {
            return None;
        }
        if !sides.contains(&PlaneSide::Back) {
            return Some(self.clone());
        }

        let count = self.points.len();
        let mut clipped = Vec::with_capacity(count + 4);
        for i in 0..count {
            let p1 = self.points[i];
            match sides[i] {
                PlaneSide::On => {
                    clipped.push(p1);
                    continue;
                }
                PlaneSide::Front => clipped.push(p1),
                PlaneSide::Back => {}
            }

            let j = (i + 1) % count;
            if sides[j] == PlaneSide::On || sides[j] == sides[i] {
                continue;
            }

            // the edge crosses the plane, emit the split point
            let p2 = self.points[j];
            let t = distances[i] / (distances[i] - distances[j]);
            let mut mid = p1 + (p2 - p1) * t;
            // avoid round off error when possible
            if let Some(axis) = plane.axial() {
                mid[axis] = plane.dist() * plane.normal()[axis];
            }
            clipped.push(mid);
        }

        (clipped.len() >= 3).then_some(Winding { points: clipped })
    }

    /// Largest signed distance of any vertex from `plane`
    pub fn max_distance(&self, plane: &Plane) -> f32 {
        self.points
            .iter()
            .map(|&p| plane.distance(p))
            .fold(f32::NEG_INFINITY, f32::max)
    }
}
