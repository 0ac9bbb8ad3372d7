use serde::{Deserialize, Serialize};

/// Number of joints on the arm.
pub const DOF: usize = 6;

/// One joint configuration in radians, index 0 is joint 1.
pub type Joints = [f64; DOF];

/// Inclusive mechanical range of a single joint, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    pub min_angle: f64,
    pub max_angle: f64,
}

impl JointLimit {
    pub fn new(min_angle: f64, max_angle: f64) -> Self {
        Self {
            min_angle,
            max_angle,
        }
    }

    pub fn contains(&self, angle: f64) -> bool {
        self.min_angle <= angle && angle <= self.max_angle
    }
}

/// Limits for the whole chain. Constant configuration, never part of a
/// single configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    limits: [JointLimit; DOF],
}

impl JointLimits {
    pub fn new(limits: [JointLimit; DOF]) -> Self {
        Self { limits }
    }

    /// Every joint within its inclusive `[min, max]` range. NaN never passes.
    pub fn contains(&self, joints: &Joints) -> bool {
        self.limits
            .iter()
            .zip(joints.iter())
            .all(|(limit, &angle)| limit.contains(angle))
    }

    /// Index and value of the first joint outside its range.
    pub fn first_violation(&self, joints: &Joints) -> Option<(usize, f64)> {
        self.limits
            .iter()
            .zip(joints.iter())
            .enumerate()
            .find(|(_, (limit, &angle))| !limit.contains(angle))
            .map(|(index, (_, &angle))| (index, angle))
    }

    pub fn as_slice(&self) -> &[JointLimit] {
        &self.limits
    }
}

/// Euclidean joint-space distance between two configurations.
pub fn joint_distance(a: &Joints, b: &Joints) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
