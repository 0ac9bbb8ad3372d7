use crate::utils::KinematicChain;
use eyre::Result;
use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::debug;

/// Angles of joints 1-3, the part of a configuration that places the wrist.
pub type ArmJoints = [f64; 3];

/// How far `cos q3` may leave [-1, 1] before the wrist center counts as out
/// of reach rather than rounding noise.
pub const REACH_TOLERANCE: f64 = 1e-9;

/// Wrist centers closer than this to joint 1's axis leave `q1` undetermined.
pub const AXIS_TOLERANCE: f64 = 1e-9;

const STRUCTURE_TOLERANCE: f64 = 1e-9;

/// Solves joints 1-3 for a wrist-center position.
///
/// Returns every real branch (possibly duplicates or mirror images). An
/// empty result means the point is out of reach; this never fails.
pub trait PositionSolver {
    fn solve_position(&self, wrist_center: &Vector3<f64>) -> Vec<ArmJoints>;
}

/// Closed-form solver for an elbow arm: vertical joint 1 axis, parallel
/// shoulder and elbow axes, no shoulder or elbow offsets.
#[derive(Debug, Clone)]
pub struct ClosedFormPositionSolver {
    shoulder_height: f64,
    upper_arm: f64,
    forearm: f64,
    // Subtracted from the geometric tilt angles to get joint values
    shoulder_zero: f64,
    elbow_zero: f64,
}

impl ClosedFormPositionSolver {
    pub fn new(chain: &KinematicChain) -> Result<Self> {
        let dh = chain.dh_parameters();
        let near = |value: f64, want: f64| (value - want).abs() < STRUCTURE_TOLERANCE;

        let elbow_arm = near(dh[0].a, 0.0)
            && near(dh[0].alpha, -FRAC_PI_2)
            && near(dh[1].alpha, 0.0)
            && near(dh[1].d, 0.0)
            && near(dh[2].a, 0.0)
            && near(dh[2].alpha, -FRAC_PI_2)
            && near(dh[2].d, 0.0);
        if !elbow_arm {
            return Err(eyre::eyre!(
                "Chain is not an offset-free elbow arm; the closed-form position solver does not apply"
            ));
        }

        if dh[1].a <= 0.0 || dh[3].d <= 0.0 {
            return Err(eyre::eyre!(
                "Upper arm ({:.4}) and forearm ({:.4}) lengths must be positive",
                dh[1].a,
                dh[3].d
            ));
        }

        Ok(Self {
            shoulder_height: dh[0].d,
            upper_arm: dh[1].a,
            forearm: dh[3].d,
            shoulder_zero: dh[1].theta + FRAC_PI_2,
            elbow_zero: dh[2].theta + FRAC_PI_2,
        })
    }

    /// Distance from the shoulder beyond which nothing is reachable.
    pub fn max_reach(&self) -> f64 {
        self.upper_arm + self.forearm
    }

    // Planar two-link solve in the arm plane. `rho` is the signed horizontal
    // distance along the plane, `height` is measured from the shoulder.
    fn solve_planar(&self, rho: f64, height: f64) -> Vec<(f64, f64)> {
        let (l2, l3) = (self.upper_arm, self.forearm);
        let cos_elbow = (rho * rho + height * height - l2 * l2 - l3 * l3) / (2.0 * l2 * l3);

        if cos_elbow.abs() > 1.0 + REACH_TOLERANCE {
            return Vec::new();
        }

        let elbow = cos_elbow.clamp(-1.0, 1.0).acos();
        [elbow, -elbow]
            .into_iter()
            .map(|phi3| {
                let phi2 = rho.atan2(height) - (l3 * phi3.sin()).atan2(l2 + l3 * phi3.cos());
                (phi2, phi3)
            })
            .collect()
    }
}

impl PositionSolver for ClosedFormPositionSolver {
    fn solve_position(&self, wrist_center: &Vector3<f64>) -> Vec<ArmJoints> {
        let radius = wrist_center.x.hypot(wrist_center.y);
        let height = wrist_center.z - self.shoulder_height;

        let shoulders = if radius < AXIS_TOLERANCE {
            vec![(0.0, 0.0)]
        } else {
            let facing = wrist_center.y.atan2(wrist_center.x);
            vec![(facing, radius), (wrap_angle(facing + PI), -radius)]
        };

        let solutions: Vec<ArmJoints> = shoulders
            .into_iter()
            .flat_map(|(q1, rho)| {
                self.solve_planar(rho, height)
                    .into_iter()
                    .map(move |(phi2, phi3)| (q1, phi2, phi3))
            })
            .map(|(q1, phi2, phi3)| {
                [
                    q1,
                    wrap_angle(phi2 - self.shoulder_zero),
                    wrap_angle(phi3 - self.elbow_zero),
                ]
            })
            .collect();

        debug!(
            "Position solve for wrist ({:.4}, {:.4}, {:.4}): {} branches",
            wrist_center.x,
            wrist_center.y,
            wrist_center.z,
            solutions.len()
        );

        solutions
    }
}

/// Wraps an angle into (-π, π].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.sin().atan2(angle.cos());
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArmConfig, DHParameter};

    fn chain() -> KinematicChain {
        KinematicChain::new(&ArmConfig::crs97()).unwrap()
    }

    fn wrist_of(chain: &KinematicChain, arm: &ArmJoints) -> Vector3<f64> {
        chain
            .partial_forward(&[arm[0], arm[1], arm[2], 0.0])
            .unwrap()
            .translation
    }

    #[test]
    fn test_every_branch_reaches_the_wrist_center() {
        let chain = chain();
        let solver = ClosedFormPositionSolver::new(&chain).unwrap();
        let target = wrist_of(&chain, &[0.4, 0.3, 0.9]);

        let solutions = solver.solve_position(&target);
        assert_eq!(solutions.len(), 4);
        for arm in &solutions {
            assert!((wrist_of(&chain, arm) - target).norm() < 1e-9);
        }
    }

    #[test]
    fn test_original_branch_is_recovered_first() {
        let chain = chain();
        let solver = ClosedFormPositionSolver::new(&chain).unwrap();
        let arm = [0.4, 0.3, 0.9];

        let first = solver.solve_position(&wrist_of(&chain, &arm))[0];
        for (got, want) in first.iter().zip(arm.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mirror_shoulder_branch() {
        let chain = chain();
        let solver = ClosedFormPositionSolver::new(&chain).unwrap();

        let solutions = solver.solve_position(&wrist_of(&chain, &[0.4, 0.3, 0.9]));
        // Reaching over the top mirrors the other elbow branch of the front solution
        assert!((solutions[2][0] - wrap_angle(0.4 + PI)).abs() < 1e-9);
        assert!((solutions[2][1] + solutions[1][1]).abs() < 1e-9);
        assert!((solutions[2][2] + solutions[1][2]).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_reach_is_empty() {
        let chain = chain();
        let solver = ClosedFormPositionSolver::new(&chain).unwrap();
        let beyond = Vector3::new(solver.max_reach() + 0.1, 0.0, 0.3302);

        assert!(solver.solve_position(&beyond).is_empty());
    }

    #[test]
    fn test_wrist_on_base_axis_yields_single_shoulder() {
        let chain = chain();
        let solver = ClosedFormPositionSolver::new(&chain).unwrap();
        let target = Vector3::new(0.0, 0.0, 0.3302 + 0.5);

        let solutions = solver.solve_position(&target);
        assert_eq!(solutions.len(), 2);
        for arm in &solutions {
            assert_eq!(arm[0], 0.0);
            assert!((wrist_of(&chain, arm) - target).norm() < 1e-9);
        }
    }

    #[test]
    fn test_fully_stretched_arm() {
        let chain = chain();
        let solver = ClosedFormPositionSolver::new(&chain).unwrap();
        let target = wrist_of(&chain, &[0.2, 0.5, 0.0]);

        let solutions = solver.solve_position(&target);
        assert!(!solutions.is_empty());
        for arm in &solutions {
            assert!((wrist_of(&chain, arm) - target).norm() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_offset_shoulder() {
        let mut dh = *chain().dh_parameters();
        dh[1] = DHParameter::new(0.3048, 0.0, 0.05, dh[1].theta);

        assert!(ClosedFormPositionSolver::new(&KinematicChain::from_dh(dh)).is_err());
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1e-12);
        assert_eq!(wrap_angle(-PI), PI);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-15);
    }
}
