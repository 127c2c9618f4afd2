//! Trace models: the convex shapes that move during a query
//!
//! A [`TraceModel`] is validated once at construction and is immutable
//! afterwards, so the query engine never has to re-check its parameters.
//! The only operation the sweep needs is [`TraceModel::support_point`]:
//! the point of the shape furthest along a direction, which offsets a
//! polytope plane by the shape's extent toward it.
//!
//! Capsules stand upright along +Z.

mod hull;

use crate::foundation::math::Vec3;
use crate::geometry::{Bounds, Plane};

/// Most points accepted for a custom hull
pub const MAX_HULL_POINTS: usize = 64;

/// Rejected trace model parameters
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidShapeError {
    /// A radius that is zero, negative or not finite
    #[error("Radius must be positive and finite, got {0}")]
    InvalidRadius(f32),

    /// Box half extents with a non-positive or non-finite component
    #[error("Box half extents must be positive and finite, got {0:?}")]
    InvalidExtents([f32; 3]),

    /// Capsule shorter than its two end caps
    #[error("Capsule height {height} is shorter than twice its radius {radius}")]
    CapsuleTooShort {
        /// Requested radius
        radius: f32,
        /// Requested total height
        height: f32,
    },

    /// Hull with too few or too many points
    #[error("Hull needs between 4 and {MAX_HULL_POINTS} points, got {0}")]
    HullPointCount(usize),

    /// Hull point with a non-finite coordinate
    #[error("Hull point has a non-finite coordinate")]
    NonFinite,

    /// Hull points do not enclose a volume
    #[error("Hull points are flat and enclose no volume")]
    FlatHull,

    /// Some hull point is not a corner of the convex hull
    #[error("Hull point {index} is not a vertex of the convex hull")]
    NonConvexHull {
        /// Index of the offending point
        index: usize,
    },
}

/// Shape description accepted by [`TraceModel::build`]
#[derive(Debug, Clone, PartialEq)]
pub enum TraceShape {
    /// A single point, used for line traces
    Point,
    /// Box centered on the origin
    Box {
        /// Half size on each axis
        half_extents: Vec3,
    },
    /// Sphere centered on the origin
    Sphere {
        /// Sphere radius
        radius: f32,
    },
    /// Upright capsule centered on the origin
    Capsule {
        /// Radius of the cylinder and of the end caps
        radius: f32,
        /// Total height including both caps
        height: f32,
    },
    /// Convex hull given by its corner points (local space)
    Hull {
        /// Hull corners; every point must be a hull vertex
        points: Vec<Vec3>,
    },
}

/// Immutable, validated trace shape with cached bounds
#[derive(Debug, Clone, PartialEq)]
pub struct TraceModel {
    shape: TraceShape,
    hull_planes: Vec<Plane>,
    bounds: Bounds,
    bounding_radius: f32,
}

fn valid_length(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl TraceModel {
    /// Validate a shape and cache its bounds
    pub fn build(shape: TraceShape) -> Result<Self, InvalidShapeError> {
        let mut hull_planes = Vec::new();
        let bounds = match &shape {
            TraceShape::Point => Bounds::from_points(&[Vec3::zeros()]),
            TraceShape::Box { half_extents } => {
                if !half_extents.iter().all(|&c| valid_length(c)) {
                    return Err(InvalidShapeError::InvalidExtents([
                        half_extents.x,
                        half_extents.y,
                        half_extents.z,
                    ]));
                }
                Bounds::from_center_extents(Vec3::zeros(), *half_extents)
            }
            TraceShape::Sphere { radius } => {
                if !valid_length(*radius) {
                    return Err(InvalidShapeError::InvalidRadius(*radius));
                }
                Bounds::from_center_extents(Vec3::zeros(), Vec3::repeat(*radius))
            }
            TraceShape::Capsule { radius, height } => {
                if !valid_length(*radius) {
                    return Err(InvalidShapeError::InvalidRadius(*radius));
                }
                if !height.is_finite() || *height < 2.0 * radius {
                    return Err(InvalidShapeError::CapsuleTooShort {
                        radius: *radius,
                        height: *height,
                    });
                }
                Bounds::from_center_extents(Vec3::zeros(), Vec3::new(*radius, *radius, height * 0.5))
            }
            TraceShape::Hull { points } => {
                if points.len() < 4 || points.len() > MAX_HULL_POINTS {
                    return Err(InvalidShapeError::HullPointCount(points.len()));
                }
                if !points.iter().flat_map(|p| p.iter()).all(|c| c.is_finite()) {
                    return Err(InvalidShapeError::NonFinite);
                }
                hull_planes = hull::hull_planes(points)?;
                Bounds::from_points(points)
            }
        };

        let bounding_radius = match &shape {
            TraceShape::Point => 0.0,
            TraceShape::Sphere { radius } => *radius,
            TraceShape::Capsule { height, .. } => height * 0.5,
            TraceShape::Hull { points } => points.iter().map(|p| p.norm()).fold(0.0, f32::max),
            TraceShape::Box { half_extents } => half_extents.norm(),
        };

        Ok(Self {
            shape,
            hull_planes,
            bounds,
            bounding_radius,
        })
    }

    /// The zero-extent trace model used for line traces
    pub fn point() -> Self {
        Self {
            shape: TraceShape::Point,
            hull_planes: Vec::new(),
            bounds: Bounds::from_points(&[Vec3::zeros()]),
            bounding_radius: 0.0,
        }
    }

    /// Box with the given half extents
    pub fn cuboid(half_extents: Vec3) -> Result<Self, InvalidShapeError> {
        Self::build(TraceShape::Box { half_extents })
    }

    /// Sphere with the given radius
    pub fn sphere(radius: f32) -> Result<Self, InvalidShapeError> {
        Self::build(TraceShape::Sphere { radius })
    }

    /// Upright capsule with the given radius and total height
    pub fn capsule(radius: f32, height: f32) -> Result<Self, InvalidShapeError> {
        Self::build(TraceShape::Capsule { radius, height })
    }

    /// Convex hull through the given corner points
    pub fn hull(points: Vec<Vec3>) -> Result<Self, InvalidShapeError> {
        Self::build(TraceShape::Hull { points })
    }

    /// The validated shape
    pub fn shape(&self) -> &TraceShape {
        &self.shape
    }

    /// Whether this is the zero-extent point model
    pub fn is_point(&self) -> bool {
        matches!(self.shape, TraceShape::Point)
    }

    /// Radius of the sphere around the local origin enclosing the shape
    #[inline]
    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Local-space bounds
    #[inline]
    pub fn local_bounds(&self) -> Bounds {
        self.bounds
    }

    /// Outward planes of a hull model (empty for the other shapes)
    pub fn hull_planes(&self) -> &[Plane] {
        &self.hull_planes
    }

    /// Point of the shape maximizing the dot product with `direction`
    pub fn support_point(&self, direction: Vec3) -> Vec3 {
        match &self.shape {
            TraceShape::Point => Vec3::zeros(),
            TraceShape::Box { half_extents } => Vec3::new(
                half_extents.x.copysign(direction.x),
                half_extents.y.copysign(direction.y),
                half_extents.z.copysign(direction.z),
            ),
            TraceShape::Sphere { radius } => unit_or_zero(direction) * *radius,
            TraceShape::Capsule { radius, height } => {
                let half_segment = height * 0.5 - radius;
                let cap = Vec3::new(0.0, 0.0, half_segment.copysign(direction.z));
                cap + unit_or_zero(direction) * *radius
            }
            TraceShape::Hull { points } => points
                .iter()
                .copied()
                .max_by(|a, b| a.dot(&direction).total_cmp(&b.dot(&direction)))
                .unwrap_or_else(Vec3::zeros),
        }
    }

    /// Extent of the shape along a unit direction (`direction · support`)
    #[inline]
    pub fn extent_along(&self, direction: Vec3) -> f32 {
        direction.dot(&self.support_point(direction))
    }
}

fn unit_or_zero(direction: Vec3) -> Vec3 {
    direction.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube_corners(half: f32) -> Vec<Vec3> {
        let mut corners = Vec::new();
        for x in [-half, half] {
            for y in [-half, half] {
                for z in [-half, half] {
                    corners.push(Vec3::new(x, y, z));
                }
            }
        }
        corners
    }

    #[test]
    fn test_degenerate_parameters_are_rejected() {
        assert_eq!(TraceModel::sphere(0.0), Err(InvalidShapeError::InvalidRadius(0.0)));
        assert!(matches!(
            TraceModel::cuboid(Vec3::new(1.0, 0.0, 1.0)),
            Err(InvalidShapeError::InvalidExtents(_))
        ));
        assert!(matches!(
            TraceModel::capsule(1.0, 1.5),
            Err(InvalidShapeError::CapsuleTooShort { .. })
        ));
        assert_eq!(
            TraceModel::hull(vec![Vec3::zeros(), Vec3::x(), Vec3::y()]),
            Err(InvalidShapeError::HullPointCount(3))
        );
    }

    #[test]
    fn test_non_convex_hull_is_rejected() {
        let mut points = cube_corners(1.0);
        points.push(Vec3::new(0.0, 0.0, 0.5));
        assert_eq!(TraceModel::hull(points), Err(InvalidShapeError::NonConvexHull { index: 8 }));
    }

    #[test]
    fn test_box_support_and_bounds() {
        let model = TraceModel::cuboid(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(model.support_point(Vec3::new(-1.0, 0.5, -0.1)), Vec3::new(-1.0, 2.0, -3.0));
        assert_eq!(model.local_bounds().max, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(model.bounding_radius(), 14.0_f32.sqrt());
        assert_relative_eq!(model.extent_along(-Vec3::z()), 3.0);
    }

    #[test]
    fn test_capsule_support_uses_end_caps() {
        let model = TraceModel::capsule(0.5, 3.0).unwrap();
        assert_relative_eq!(model.support_point(Vec3::z()), Vec3::new(0.0, 0.0, 1.5));
        assert_relative_eq!(model.support_point(Vec3::x()), Vec3::new(0.5, 0.0, 1.0));
        assert_relative_eq!(model.extent_along(-Vec3::z()), 1.5);
        assert_relative_eq!(model.bounding_radius(), 1.5);
    }

    #[test]
    fn test_sphere_support_is_radial() {
        let model = TraceModel::sphere(2.0).unwrap();
        let direction = Vec3::new(1.0, 1.0, 0.0);
        assert_relative_eq!(model.support_point(direction), direction.normalize() * 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_hull_support_scans_vertices() {
        let model = TraceModel::hull(cube_corners(0.5)).unwrap();
        assert_eq!(model.hull_planes().len(), 6);
        assert_eq!(model.support_point(Vec3::new(1.0, -1.0, 1.0)), Vec3::new(0.5, -0.5, 0.5));
    }

    #[test]
    fn test_point_model() {
        let model = TraceModel::point();
        assert!(model.is_point());
        assert_eq!(model.support_point(Vec3::x()), Vec3::zeros());
        assert_eq!(model.bounding_radius(), 0.0);
        assert_eq!(TraceModel::build(TraceShape::Point), Ok(model));
    }
}
