use crate::types::{joint_distance, Joints, Pose};
use crate::utils::{MotionPlanner, PositionSolver};
use eyre::Result;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Source of the arm's present joint configuration.
pub trait JointStateSource {
    fn current_joints(&self) -> Result<Joints>;
}

/// Commands a configuration and blocks until the arm stops moving.
pub trait MotionDispatcher {
    fn execute_and_wait(&mut self, joints: &Joints) -> Result<()>;
}

/// Outcome of one planning cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionReport {
    pub start_joints: Joints,
    pub target_position: [f64; 3],
    pub executed_joints: Joints,
    /// Euclidean joint-space distance travelled
    pub joint_distance: f64,
}

/// One planning cycle: read the current joints once, plan, dispatch once.
///
/// A planning failure returns a [`crate::PlanError`] (recoverable with
/// `downcast_ref`) and leaves the arm uncommanded.
pub fn move_to_pose<P, A>(planner: &MotionPlanner<P>, arm: &mut A, target: &Pose) -> Result<MotionReport>
where
    P: PositionSolver,
    A: JointStateSource + MotionDispatcher,
{
    let start_joints = arm.current_joints()?;
    run_cycle(planner, arm, start_joints, target)
}

/// Moves the tool tip to `position`, keeping its current orientation.
pub fn move_to_position<P, A>(
    planner: &MotionPlanner<P>,
    arm: &mut A,
    position: [f64; 3],
) -> Result<MotionReport>
where
    P: PositionSolver,
    A: JointStateSource + MotionDispatcher,
{
    let start_joints = arm.current_joints()?;
    let current_pose = planner.forward(&start_joints);
    let target = current_pose.with_translation(Vector3::from(position));
    run_cycle(planner, arm, start_joints, &target)
}

/// Shifts the tool tip by `delta` in the base frame, keeping its orientation.
pub fn move_relative<P, A>(
    planner: &MotionPlanner<P>,
    arm: &mut A,
    delta: [f64; 3],
) -> Result<MotionReport>
where
    P: PositionSolver,
    A: JointStateSource + MotionDispatcher,
{
    let start_joints = arm.current_joints()?;
    let current_pose = planner.forward(&start_joints);
    let target = current_pose.with_translation(current_pose.translation + Vector3::from(delta));
    run_cycle(planner, arm, start_joints, &target)
}

fn run_cycle<P, A>(
    planner: &MotionPlanner<P>,
    arm: &mut A,
    start_joints: Joints,
    target: &Pose,
) -> Result<MotionReport>
where
    P: PositionSolver,
    A: MotionDispatcher,
{
    debug!(
        "Planning move to ({:.3}, {:.3}, {:.3})",
        target.translation.x, target.translation.y, target.translation.z
    );

    let executed_joints = planner.plan(target, &start_joints)?;

    info!("Executing joints {:?}", executed_joints);
    arm.execute_and_wait(&executed_joints)?;
    info!("Movement finished");

    Ok(MotionReport {
        start_joints,
        target_position: [target.translation.x, target.translation.y, target.translation.z],
        joint_distance: joint_distance(&start_joints, &executed_joints),
        executed_joints,
    })
}

/// In-memory arm that reaches every commanded configuration instantly.
#[derive(Debug, Clone)]
pub struct SimulatedArm {
    joints: Joints,
    executed: Vec<Joints>,
}

impl SimulatedArm {
    pub fn new(joints: Joints) -> Self {
        Self {
            joints,
            executed: Vec::new(),
        }
    }

    /// Every configuration dispatched so far, oldest first.
    pub fn executed(&self) -> &[Joints] {
        &self.executed
    }
}

impl JointStateSource for SimulatedArm {
    fn current_joints(&self) -> Result<Joints> {
        Ok(self.joints)
    }
}

impl MotionDispatcher for SimulatedArm {
    fn execute_and_wait(&mut self, joints: &Joints) -> Result<()> {
        if joints.iter().any(|q| !q.is_finite()) {
            return Err(eyre::eyre!("Refusing non-finite joint command {:?}", joints));
        }

        self.joints = *joints;
        self.executed.push(*joints);
        Ok(())
    }
}
