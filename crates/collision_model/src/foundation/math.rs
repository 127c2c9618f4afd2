//! Math utilities and types
//!
//! Provides the fundamental math types used by the collision code.

pub use nalgebra::{Matrix3, Unit, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Rotations whose half-angle sine is below this count as the identity
pub const ROTATION_EPSILON: f32 = 1e-6;

/// Whether `rotation` is the identity within [`ROTATION_EPSILON`]
#[inline]
pub fn is_identity_rotation(rotation: &Quat) -> bool {
    rotation.imag().norm() <= ROTATION_EPSILON
}

/// Rigid placement: a position and an orientation.
///
/// Collision geometry is never scaled, so unlike render transforms this
/// carries no scale component and its inverse is exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Whether the rotation part is the identity
    pub fn is_axis_aligned(&self) -> bool {
        is_identity_rotation(&self.rotation)
    }

    /// Rotation as a 3x3 matrix
    pub fn rotation_matrix(&self) -> Mat3 {
        *self.rotation.to_rotation_matrix().matrix()
    }

    /// Apply this transform to a point (local to world)
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.position
    }

    /// Apply this transform's rotation to a vector (local to world)
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// Map a world point into this transform's local space
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&(point - self.position))
    }

    /// Map a world vector into this transform's local space
    pub fn inverse_transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&vector)
    }

    /// Combine this transform with another (`self` applied after `other`)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * other.position,
            rotation: self.rotation * other.rotation,
        }
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        Transform {
            position: inv_rotation * (-self.position),
            rotation: inv_rotation,
        }
    }
}
