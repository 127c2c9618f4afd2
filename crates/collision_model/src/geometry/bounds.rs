//! Axis-aligned bounding boxes

use super::GeometryError;
use crate::foundation::math::{Transform, Vec3};

/// Axis-aligned box given by its min and max corners.
///
/// [`Bounds::EMPTY`] has min above max on every axis; adding a point to
/// it yields that point. Every query on an empty bounds reports no
/// overlap and no containment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    /// The cleared bounds that contains nothing
    pub const EMPTY: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Create bounds from corners, rejecting inverted or non-finite input
    pub fn new(min: Vec3, max: Vec3) -> Result<Self, GeometryError> {
        if !min.iter().chain(max.iter()).all(|c| c.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        if (0..3).any(|axis| min[axis] > max[axis]) {
            return Err(GeometryError::InvertedBounds);
        }
        Ok(Self { min, max })
    }

    /// Box of the given half extents around a center point
    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest bounds containing all points (empty for no points)
    pub fn from_points(points: &[Vec3]) -> Self {
        points.iter().fold(Self::EMPTY, |bounds, &p| bounds.with_point(p))
    }

    /// Whether nothing is contained
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    /// Grow to include a point
    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Copy grown to include a point
    #[must_use]
    pub fn with_point(mut self, point: Vec3) -> Self {
        self.add_point(point);
        self
    }

    /// Smallest bounds containing both
    #[must_use]
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Overlapping region (empty when disjoint)
    #[must_use]
    pub fn intersection(&self, other: &Bounds) -> Bounds {
        let result = Bounds {
            min: self.min.sup(&other.min),
            max: self.max.inf(&other.max),
        };
        if result.is_empty() {
            Self::EMPTY
        } else {
            result
        }
    }

    /// Whether the boxes overlap (touching counts)
    pub fn intersects(&self, other: &Bounds) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    /// Whether a point lies inside or on the surface
    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Whether `other` lies entirely inside
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        !other.is_empty() && self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Copy grown by `amount` on every side
    #[must_use]
    pub fn expanded(&self, amount: f32) -> Bounds {
        if self.is_empty() {
            return *self;
        }
        let delta = Vec3::repeat(amount);
        Bounds {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Copy moved by `offset`
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Bounds {
        Bounds {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Bounds of this box after applying a rigid transform
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Bounds {
        if self.is_empty() {
            return *self;
        }
        let rotation = transform.rotation_matrix().abs();
        let center = transform.transform_point(self.center());
        let extents = rotation * self.extents();
        Bounds::from_center_extents(center, extents)
    }

    /// Bounds of this box after applying the inverse of a rigid transform
    #[must_use]
    pub fn inverse_transformed(&self, transform: &Transform) -> Bounds {
        self.transformed(&transform.inverse())
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half size on each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Radius of the sphere around the origin containing the box
    pub fn radius(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        (0..3)
            .map(|axis| {
                let c = self.min[axis].abs().max(self.max[axis].abs());
                c * c
            })
            .sum::<f32>()
            .sqrt()
    }

    /// Euclidean distance from a point to the box (0 inside)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        if self.is_empty() {
            return f32::INFINITY;
        }
        let clamped = point.sup(&self.min).inf(&self.max);
        (point - clamped).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    fn cube(half: f32) -> Bounds {
        Bounds::from_center_extents(Vec3::zeros(), Vec3::repeat(half))
    }

    #[test]
    fn test_empty_state() {
        let empty = Bounds::EMPTY;
        assert!(empty.is_empty());
        assert!(!empty.intersects(&cube(1.0)));
        assert!(!empty.contains_point(Vec3::zeros()));
        assert_eq!(Bounds::from_points(&[]), Bounds::EMPTY);
        assert_eq!(empty.with_point(Vec3::x()), Bounds { min: Vec3::x(), max: Vec3::x() });
    }

    #[test]
    fn test_new_rejects_inverted() {
        assert_eq!(Bounds::new(Vec3::x(), Vec3::zeros()), Err(GeometryError::InvertedBounds));
        assert!(Bounds::new(Vec3::zeros(), Vec3::zeros()).is_ok());
    }

    #[test]
    fn test_union_intersection_containment() {
        let a = cube(1.0);
        let b = a.translated(Vec3::new(1.5, 0.0, 0.0));
        let far = a.translated(Vec3::new(10.0, 0.0, 0.0));

        let union = a.union(&b);
        assert_eq!(union.min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(union.max, Vec3::new(2.5, 1.0, 1.0));
        assert!(union.contains_bounds(&a) && union.contains_bounds(&b));

        let overlap = a.intersection(&b);
        assert_eq!(overlap.min.x, 0.5);
        assert_eq!(overlap.max.x, 1.0);
        assert!(a.intersects(&b));

        assert!(a.intersection(&far).is_empty());
        assert!(!a.intersects(&far));
    }

    #[test]
    fn test_transformed_rotated_box_grows() {
        let transform = Transform::from_position_rotation(
            Vec3::new(0.0, 0.0, 5.0),
            Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_4),
        );
        let rotated = cube(1.0).transformed(&transform);
        let diagonal = std::f32::consts::SQRT_2;

        assert_relative_eq!(rotated.max, Vec3::new(diagonal, diagonal, 6.0), epsilon = 1e-5);
        assert_relative_eq!(rotated.min, Vec3::new(-diagonal, -diagonal, 4.0), epsilon = 1e-5);
    }

    #[test]
    fn test_distance_and_radius() {
        let a = cube(1.0);
        assert_eq!(a.distance_to_point(Vec3::new(0.5, 0.0, 0.0)), 0.0);
        assert_relative_eq!(a.distance_to_point(Vec3::new(4.0, 0.0, 0.0)), 3.0);
        assert_relative_eq!(a.radius(), 3.0_f32.sqrt());
    }
}
