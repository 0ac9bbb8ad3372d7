use eyre::Result;
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::ops::Mul;

/// Largest deviation from `RᵀR = I` (and from `det R = 1`) accepted when a
/// pose is built from an untrusted homogeneous matrix.
pub const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// Rigid transform in 3D: a proper rotation followed by a translation.
///
/// Poses are plain values. Composition follows the homogeneous-matrix
/// convention, so `a * b` maps points of frame `b` through `b` and then `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Builds a pose from parts that are already known to be rigid, e.g. the
    /// product of DH link transforms.
    pub fn from_parts(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::new(x, y, z),
        }
    }

    /// Builds a pose from a 4x4 homogeneous matrix, rejecting anything that is
    /// not a rigid transform within [`ORTHONORMAL_TOLERANCE`].
    pub fn from_homogeneous(matrix: &Matrix4<f64>) -> Result<Self> {
        let bottom = [matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)], matrix[(3, 3)]];
        let expected = [0.0, 0.0, 0.0, 1.0];
        if bottom
            .iter()
            .zip(expected.iter())
            .any(|(value, want)| (value - want).abs() > ORTHONORMAL_TOLERANCE)
        {
            return Err(eyre::eyre!(
                "Homogeneous matrix bottom row {:?} is not [0, 0, 0, 1]",
                bottom
            ));
        }

        let rotation = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        if !is_rotation(&rotation, ORTHONORMAL_TOLERANCE) {
            return Err(eyre::eyre!(
                "Rotation block is not orthonormal with determinant +1: {}",
                rotation
            ));
        }

        let translation = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        Ok(Self {
            rotation,
            translation,
        })
    }

    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.rotation);
        matrix[(0, 3)] = self.translation.x;
        matrix[(1, 3)] = self.translation.y;
        matrix[(2, 3)] = self.translation.z;
        matrix
    }

    /// Closed-form rigid inverse: `(R, t)⁻¹ = (Rᵀ, -Rᵀt)`.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.transpose();
        Self {
            translation: -(rotation * self.translation),
            rotation,
        }
    }

    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point + self.translation
    }

    /// Same rotation, new translation.
    pub fn with_translation(&self, translation: Vector3<f64>) -> Self {
        Self {
            rotation: self.rotation,
            translation,
        }
    }

    /// Euclidean distance between the two origins.
    pub fn translation_error(&self, other: &Pose) -> f64 {
        (self.translation - other.translation).norm()
    }

    /// Angle (radians) of the relative rotation between the two poses.
    pub fn rotation_error(&self, other: &Pose) -> f64 {
        let relative = self.rotation.transpose() * other.rotation;
        // atan2 keeps precision for small angles where acos of the trace does not
        let axis = Vector3::new(
            relative[(2, 1)] - relative[(1, 2)],
            relative[(0, 2)] - relative[(2, 0)],
            relative[(1, 0)] - relative[(0, 1)],
        );
        axis.norm().atan2(relative.trace() - 1.0)
    }

    pub fn approx_eq(&self, other: &Pose, tolerance: f64) -> bool {
        self.translation_error(other) <= tolerance && self.rotation_error(other) <= tolerance
    }

    /// Roll, pitch and yaw (X-Y-Z fixed angles) of the rotation, for reporting.
    pub fn euler_angles(&self) -> Vector3<f64> {
        let rotation = &self.rotation;
        let sy = (rotation[(0, 0)].powi(2) + rotation[(1, 0)].powi(2)).sqrt();

        if sy >= 1e-6 {
            Vector3::new(
                rotation[(2, 1)].atan2(rotation[(2, 2)]),
                (-rotation[(2, 0)]).atan2(sy),
                rotation[(1, 0)].atan2(rotation[(0, 0)]),
            )
        } else {
            Vector3::new(
                (-rotation[(1, 2)]).atan2(rotation[(1, 1)]),
                (-rotation[(2, 0)]).atan2(sy),
                0.0,
            )
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            rotation: self.rotation * rhs.rotation,
            translation: self.rotation * rhs.translation + self.translation,
        }
    }
}

/// True when `rotation` is orthonormal with determinant +1 within `tolerance`.
pub fn is_rotation(rotation: &Matrix3<f64>, tolerance: f64) -> bool {
    let gram = rotation.transpose() * rotation;
    let orthonormal = (gram - Matrix3::identity()).amax() <= tolerance;
    orthonormal && (rotation.determinant() - 1.0).abs() <= tolerance
}
