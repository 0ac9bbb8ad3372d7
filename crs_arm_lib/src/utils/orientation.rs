use nalgebra::Matrix3;
use std::f64::consts::PI;
use tracing::debug;

/// Angles of joints 4-6.
pub type WristJoints = [f64; 3];

/// Distance of `R36[2][2]` from ±1 under which the wrist is treated as
/// singular.
pub const SINGULARITY_EPSILON: f64 = 1e-8;

/// Shape of the residual wrist rotation `R36 = Rz(q4) · Ry(-q5) · Rz(q6)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WristCase {
    /// `R36[2][2] ≈ +1`: q5 = 0, only `q4 + q6` is determined.
    Upright,
    /// `R36[2][2] ≈ -1`: q5 = π, only `q6 - q4` is determined.
    Inverted,
    /// Two wrist-flip branches with `|q5| = theta5`.
    Regular { theta5: f64 },
}

impl WristCase {
    pub fn classify(r36: &Matrix3<f64>) -> Self {
        let cos_q5 = r36[(2, 2)];
        if (cos_q5 - 1.0).abs() <= SINGULARITY_EPSILON {
            WristCase::Upright
        } else if (cos_q5 + 1.0).abs() <= SINGULARITY_EPSILON {
            WristCase::Inverted
        } else {
            WristCase::Regular {
                theta5: cos_q5.clamp(-1.0, 1.0).acos(),
            }
        }
    }
}

/// Solves the spherical wrist (joints 4-6) by Z-Y-Z Euler decomposition.
#[derive(Debug, Clone, Copy)]
pub struct OrientationSolver {
    /// Value joint 4 is pinned to at a wrist singularity.
    singular_theta4: f64,
}

impl Default for OrientationSolver {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl OrientationSolver {
    pub fn new(singular_theta4: f64) -> Self {
        Self { singular_theta4 }
    }

    pub fn singular_theta4(&self) -> f64 {
        self.singular_theta4
    }

    /// Rotation the wrist must realize: `R36 = R03ᵀ · R_flange`.
    pub fn residual(r03: &Matrix3<f64>, flange_rotation: &Matrix3<f64>) -> Matrix3<f64> {
        r03.transpose() * flange_rotation
    }

    pub fn solve(&self, r03: &Matrix3<f64>, flange_rotation: &Matrix3<f64>) -> Vec<WristJoints> {
        self.solve_residual(&Self::residual(r03, flange_rotation))
    }

    /// Wrist branches for a residual rotation, in a fixed order: a single
    /// branch at a singularity, otherwise the `s = +1` branch then `s = -1`.
    pub fn solve_residual(&self, p: &Matrix3<f64>) -> Vec<WristJoints> {
        let theta4 = self.singular_theta4;

        match WristCase::classify(p) {
            WristCase::Upright => {
                debug!("Wrist singularity (upright), pinning q4 = {:.4}", theta4);
                vec![[theta4, 0.0, p[(1, 0)].atan2(p[(0, 0)]) - theta4]]
            }
            WristCase::Inverted => {
                debug!("Wrist singularity (inverted), pinning q4 = {:.4}", theta4);
                vec![[theta4, PI, p[(1, 0)].atan2(-p[(0, 0)]) + theta4]]
            }
            WristCase::Regular { theta5 } => [1.0, -1.0]
                .into_iter()
                .map(|s: f64| {
                    [
                        (p[(1, 2)] * s).atan2(p[(0, 2)] * s),
                        if s > 0.0 { -theta5 } else { theta5 },
                        (p[(2, 1)] * s).atan2(-p[(2, 0)] * s),
                    ]
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Vector3};

    fn wrist_rotation(q: &WristJoints) -> Matrix3<f64> {
        let rz = |angle: f64| Rotation3::from_axis_angle(&Vector3::z_axis(), angle).into_inner();
        let ry = |angle: f64| Rotation3::from_axis_angle(&Vector3::y_axis(), angle).into_inner();
        rz(q[0]) * ry(-q[1]) * rz(q[2])
    }

    #[test]
    fn test_upright_singularity_single_branch() {
        let solver = OrientationSolver::default();
        let residual = wrist_rotation(&[0.3, 0.0, 0.5]);

        let branches = solver.solve_residual(&residual);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0][0], 0.0);
        assert_eq!(branches[0][1], 0.0);
        assert!((branches[0][2] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_identity_is_upright() {
        let branches = OrientationSolver::default().solve_residual(&Matrix3::identity());

        assert_eq!(branches, vec![[0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_inverted_singularity_single_branch() {
        let solver = OrientationSolver::default();
        let q = [0.2, PI, 0.9];
        let residual = wrist_rotation(&q);

        let branches = solver.solve_residual(&residual);
        assert_eq!(WristCase::classify(&residual), WristCase::Inverted);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0][1], PI);
        assert!((wrist_rotation(&branches[0]) - residual).amax() < 1e-9);
    }

    #[test]
    fn test_regular_case_yields_wrist_flip_pair() {
        let solver = OrientationSolver::default();
        let residual = wrist_rotation(&[0.4, 0.7, -1.2]);

        let branches = solver.solve_residual(&residual);
        assert_eq!(branches.len(), 2);
        assert!((branches[0][1] + 0.7).abs() < 1e-9);
        assert!((branches[1][1] - 0.7).abs() < 1e-9);
        assert!((branches[1][0] - 0.4).abs() < 1e-9);
        assert!((branches[1][2] + 1.2).abs() < 1e-9);
        for branch in &branches {
            assert!((wrist_rotation(branch) - residual).amax() < 1e-9);
        }
    }

    #[test]
    fn test_negative_pitch_recovered_by_first_branch() {
        let solver = OrientationSolver::default();
        let q = [-2.0, -0.5, 2.5];

        let branches = solver.solve_residual(&wrist_rotation(&q));
        for (got, want) in branches[0].iter().zip(q.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pinned_theta4_is_parameterizable() {
        let solver = OrientationSolver::new(0.25);
        let residual = wrist_rotation(&[1.0, 0.0, -0.3]);

        let branches = solver.solve_residual(&residual);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0][0], 0.25);
        assert!((wrist_rotation(&branches[0]) - residual).amax() < 1e-9);
    }

    #[test]
    fn test_near_singular_within_epsilon() {
        let residual = wrist_rotation(&[0.0, 1e-5, 0.0]);

        // cos(1e-5) differs from 1 by 5e-11
        assert_eq!(WristCase::classify(&residual), WristCase::Upright);
        assert!(matches!(
            WristCase::classify(&wrist_rotation(&[0.0, 1e-3, 0.0])),
            WristCase::Regular { .. }
        ));
    }

    #[test]
    fn test_residual_uses_first_three_links() {
        let r03 = Rotation3::from_euler_angles(0.1, -0.4, 0.8).into_inner();
        let r36 = wrist_rotation(&[0.3, 0.6, 0.9]);

        let residual = OrientationSolver::residual(&r03, &(r03 * r36));
        assert!((residual - r36).amax() < 1e-12);
    }
}
