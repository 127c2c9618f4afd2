//! Geometry primitives
//!
//! Immutable value types shared by the loader and the query engine:
//!
//! - [`Plane`] / [`PlaneSide`] - oriented planes and side classification
//! - [`PlaneSet`] - deduplicating pool of planes stored in opposite pairs
//! - [`Winding`] - convex planar polygons, clipped against planes
//! - [`Bounds`] - axis-aligned boxes with an explicit empty state
//!
//! All operations are pure. Malformed input is rejected with a
//! [`GeometryError`] instead of producing NaNs further down the line.

pub mod bounds;
pub mod plane;
pub mod winding;

pub use bounds::Bounds;
pub use plane::{Plane, PlaneSet, PlaneSide};
pub use winding::Winding;

/// Tolerance for a normal to count as unit length
pub const NORMAL_LENGTH_EPSILON: f32 = 1e-4;

/// Malformed geometric input
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A winding needs at least three points
    #[error("Winding needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    /// A coordinate or distance is NaN or infinite
    #[error("Non-finite coordinate in geometric input")]
    NonFinite,

    /// Plane normal is not unit length
    #[error("Plane normal is not unit length (length {length})")]
    NonUnitNormal {
        /// Actual length of the offending normal
        length: f32,
    },

    /// A normal could not be derived (zero length or collinear points)
    #[error("Degenerate normal: cannot normalize a zero-length vector")]
    DegenerateNormal,

    /// Bounds with min greater than max on some axis
    #[error("Inverted bounds: min must not exceed max")]
    InvertedBounds,
}
