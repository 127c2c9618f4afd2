//! Oriented planes and the deduplicating plane set

use std::collections::HashMap;
use std::ops::Neg;

use super::{GeometryError, NORMAL_LENGTH_EPSILON};
use crate::foundation::math::Vec3;

/// Which side of a plane a point lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneSide {
    /// Strictly in front (outside) by more than the tolerance
    Front,
    /// Strictly behind (inside) by more than the tolerance
    Back,
    /// Within the tolerance of the plane
    On,
}

/// A plane `normal · p = dist` with a unit normal.
///
/// The normal points to the front side. For polytope boundaries the front
/// side is outside the solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    dist: f32,
}

impl Plane {
    /// Create a plane from a unit normal and a distance from the origin
    pub fn new(normal: Vec3, dist: f32) -> Result<Self, GeometryError> {
        if !normal.iter().all(|c| c.is_finite()) || !dist.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let length = normal.norm();
        if (length - 1.0).abs() > NORMAL_LENGTH_EPSILON {
            return Err(GeometryError::NonUnitNormal { length });
        }
        Ok(Self { normal, dist })
    }

    /// Create a plane from any non-zero normal, normalizing it first
    pub fn from_normal(normal: Vec3, dist: f32) -> Result<Self, GeometryError> {
        if !normal.iter().all(|c| c.is_finite()) || !dist.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let length = normal.norm();
        if length <= f32::EPSILON {
            return Err(GeometryError::DegenerateNormal);
        }
        Ok(Self {
            normal: normal / length,
            dist: dist / length,
        })
    }

    /// Create the plane through a point with the given normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Result<Self, GeometryError> {
        let plane = Self::from_normal(normal, 0.0)?;
        Ok(Self {
            dist: plane.normal.dot(&point),
            ..plane
        })
    }

    /// Plane through three points; counter-clockwise points face the viewer
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Result<Self, GeometryError> {
        Self::from_point_normal(a, (b - a).cross(&(c - a)))
    }

    /// The unit normal
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Distance of the plane from the origin along the normal
    pub fn dist(&self) -> f32 {
        self.dist
    }

    /// Signed distance from the plane; positive in front
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) - self.dist
    }

    /// Classify a point against the plane with an absolute tolerance
    pub fn side(&self, point: Vec3, epsilon: f32) -> PlaneSide {
        let d = self.distance(point);
        if d > epsilon {
            PlaneSide::Front
        } else if d < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::On
        }
    }

    /// The same plane facing the other way
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            dist: -self.dist,
        }
    }

    /// The same plane moved along its normal
    pub fn translated_along_normal(&self, offset: f32) -> Self {
        Self {
            dist: self.dist + offset,
            ..*self
        }
    }

    /// Whether both planes agree within the given tolerances
    pub fn approx_eq(&self, other: &Plane, normal_epsilon: f32, dist_epsilon: f32) -> bool {
        (self.dist - other.dist).abs() <= dist_epsilon
            && (self.normal - other.normal).iter().all(|c| c.abs() <= normal_epsilon)
    }

    /// Index of the axis this plane is perpendicular to, if any
    pub fn axial(&self) -> Option<usize> {
        (0..3).find(|&axis| self.normal[axis].abs() == 1.0)
    }
}

impl Neg for Plane {
    type Output = Plane;

    fn neg(self) -> Plane {
        self.flipped()
    }
}

/// Pool of unique planes.
///
/// Planes are always inserted together with their flipped twin, so the
/// opposite of plane `i` is plane `i ^ 1`. Lookup hashes on the integer
/// part of the distance and checks neighbouring buckets, so planes that
/// differ by less than the tolerances resolve to the same index.
#[derive(Debug, Clone)]
pub struct PlaneSet {
    planes: Vec<Plane>,
    buckets: HashMap<i64, Vec<usize>>,
    normal_epsilon: f32,
    dist_epsilon: f32,
}

impl PlaneSet {
    /// Create an empty set with the given merge tolerances
    pub fn new(normal_epsilon: f32, dist_epsilon: f32) -> Self {
        Self {
            planes: Vec::new(),
            buckets: HashMap::new(),
            normal_epsilon,
            dist_epsilon,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bucket(dist: f32) -> i64 {
        dist.floor() as i64
    }

    /// Index of a stored plane matching `plane` within tolerance
    pub fn find(&self, plane: &Plane) -> Option<usize> {
        let key = Self::bucket(plane.dist);
        (key - 1..=key + 1)
            .filter_map(|k| self.buckets.get(&k))
            .flatten()
            .copied()
            .find(|&index| self.planes[index].approx_eq(plane, self.normal_epsilon, self.dist_epsilon))
    }

    /// Index of `plane`, inserting it (and its opposite) when new
    pub fn find_or_insert(&mut self, plane: Plane) -> usize {
        if let Some(index) = self.find(&plane) {
            return index;
        }
        let index = self.planes.len();
        for (offset, p) in [plane, plane.flipped()].into_iter().enumerate() {
            self.buckets.entry(Self::bucket(p.dist)).or_default().push(index + offset);
            self.planes.push(p);
        }
        index
    }

    /// Index of the plane facing the other way
    #[inline]
    pub const fn opposite(index: usize) -> usize {
        index ^ 1
    }

    /// Plane at `index`
    #[inline]
    pub fn get(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    /// Number of stored planes (always even)
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Whether the set holds no planes
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// All stored planes in index order
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }
}
