use crate::types::{
    is_rotation, joint_distance, ArmConfig, JointLimits, Joints, Pose, ORTHONORMAL_TOLERANCE,
};
use crate::utils::{
    ClosedFormPositionSolver, KinematicChain, OrientationSolver, PositionSolver, ToolTransform,
};
use eyre::Result;
use nalgebra::Vector3;
use tracing::{debug, warn};

/// Why a target tool pose produced no configuration to move to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("No inverse kinematics solution: target is out of reach")]
    Unreachable,

    #[error("All {candidates} inverse kinematics solutions violate joint limits")]
    OutOfLimits { candidates: usize },

    #[error("Target is not a rigid transform")]
    InvalidPose,
}

/// Tool-tip inverse kinematics with joint-limit filtering and
/// nearest-solution selection.
///
/// Geometry, tool and limits are fixed at construction; every method is a
/// pure function of its arguments, so one planner can serve concurrent
/// callers.
#[derive(Debug, Clone)]
pub struct MotionPlanner<P = ClosedFormPositionSolver> {
    chain: KinematicChain,
    tool: ToolTransform,
    position_solver: P,
    orientation_solver: OrientationSolver,
    limits: JointLimits,
}

impl MotionPlanner<ClosedFormPositionSolver> {
    pub fn from_config(config: &ArmConfig) -> Result<Self> {
        config.validate()?;
        let chain = KinematicChain::new(config)?;
        let position_solver = ClosedFormPositionSolver::new(&chain)?;

        Ok(Self::new(
            chain,
            ToolTransform::from_config(&config.tool),
            position_solver,
            config.limits()?,
        ))
    }
}

impl<P: PositionSolver> MotionPlanner<P> {
    pub fn new(
        chain: KinematicChain,
        tool: ToolTransform,
        position_solver: P,
        limits: JointLimits,
    ) -> Self {
        Self {
            chain,
            tool,
            position_solver,
            orientation_solver: OrientationSolver::default(),
            limits,
        }
    }

    pub fn with_orientation_solver(mut self, orientation_solver: OrientationSolver) -> Self {
        self.orientation_solver = orientation_solver;
        self
    }

    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    pub fn tool(&self) -> &ToolTransform {
        &self.tool
    }

    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Tool-tip pose for a configuration.
    pub fn forward(&self, joints: &Joints) -> Pose {
        self.tool.forward(&self.chain.forward_kinematics(joints))
    }

    /// Wrist center for a required flange pose: `d6` back along flange z.
    pub fn wrist_center(&self, flange_pose: &Pose) -> Vector3<f64> {
        flange_pose.transform_point(&Vector3::new(0.0, 0.0, -self.chain.flange_length()))
    }

    /// Every configuration placing the tool tip at `tool_pose`.
    ///
    /// Position branches come in solver order; each expands into its wrist
    /// branches in [`OrientationSolver::solve_residual`] order. Empty when
    /// the wrist center is out of reach.
    pub fn inverse(&self, tool_pose: &Pose) -> Vec<Joints> {
        let flange_pose = self.tool.backward(tool_pose);
        let wrist_center = self.wrist_center(&flange_pose);

        let mut candidates = Vec::new();
        for arm in self.position_solver.solve_position(&wrist_center) {
            let r03 = self.chain.arm_frame(&arm).rotation;
            for wrist in self.orientation_solver.solve(&r03, &flange_pose.rotation) {
                candidates.push([arm[0], arm[1], arm[2], wrist[0], wrist[1], wrist[2]]);
            }
        }

        debug!("Inverse kinematics produced {} candidates", candidates.len());
        candidates
    }

    /// Candidates, limit-filtered, nearest to `current`.
    ///
    /// The target must be rigid within [`ORTHONORMAL_TOLERANCE`] with a finite
    /// translation, otherwise nothing is solved.
    pub fn plan(&self, tool_pose: &Pose, current: &Joints) -> Result<Joints, PlanError> {
        if !is_rotation(&tool_pose.rotation, ORTHONORMAL_TOLERANCE)
            || tool_pose.translation.iter().any(|v| !v.is_finite())
        {
            warn!("Rejecting non-rigid target pose");
            return Err(PlanError::InvalidPose);
        }

        let candidates = self.inverse(tool_pose);
        if candidates.is_empty() {
            warn!("Target tool pose is out of reach");
            return Err(PlanError::Unreachable);
        }

        let total = candidates.len();
        let valid = filter_within_limits(candidates, &self.limits);
        debug!("{} of {} candidates within joint limits", valid.len(), total);

        select_nearest(&valid, current).ok_or_else(|| {
            warn!("All {} candidates violate joint limits", total);
            PlanError::OutOfLimits { candidates: total }
        })
    }
}

/// Keeps the candidates with every joint inside its inclusive range, in
/// their original order.
pub fn filter_within_limits(candidates: Vec<Joints>, limits: &JointLimits) -> Vec<Joints> {
    candidates
        .into_iter()
        .filter(|joints| limits.contains(joints))
        .collect()
}

/// Candidate with the smallest Euclidean joint-space distance to `current`.
/// Exact ties go to the earliest candidate.
pub fn select_nearest(candidates: &[Joints], current: &Joints) -> Option<Joints> {
    let mut best: Option<(f64, Joints)> = None;

    for candidate in candidates {
        let distance = joint_distance(candidate, current);
        match best {
            Some((best_distance, _)) if distance >= best_distance => {}
            _ => best = Some((distance, *candidate)),
        }
    }

    best.map(|(_, joints)| joints)
}
