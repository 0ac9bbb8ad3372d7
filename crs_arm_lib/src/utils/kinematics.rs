use crate::types::{ArmConfig, DHParameter, Joints, Pose, DOF};
use eyre::Result;
use nalgebra::{Matrix3, Vector3};

/// Serial chain described by standard Denavit-Hartenberg parameters.
///
/// Frame `i` is reached from frame `i - 1` by `Rz(θ) · Tz(d) · Tx(a) · Rx(α)`
/// where `θ = q[i] + theta_offset`.
#[derive(Debug, Clone)]
pub struct KinematicChain {
    dh_params: [DHParameter; DOF],
}

impl KinematicChain {
    pub fn new(config: &ArmConfig) -> Result<Self> {
        let dh_params: [DHParameter; DOF] = config
            .kinematics
            .dh_parameters
            .as_slice()
            .try_into()
            .map_err(|_| eyre::eyre!("Joint angles count doesn't match DH parameters"))?;
        Ok(Self::from_dh(dh_params))
    }

    pub fn from_dh(dh_params: [DHParameter; DOF]) -> Self {
        Self { dh_params }
    }

    pub fn dh_parameters(&self) -> &[DHParameter; DOF] {
        &self.dh_params
    }

    /// Flange pose for a full configuration.
    pub fn forward_kinematics(&self, joints: &Joints) -> Pose {
        self.chain_pose(joints)
    }

    /// Pose of frame `joints.len()` using only the leading links, e.g. the
    /// first three joints give the frame the wrist rotates in.
    pub fn partial_forward(&self, joints: &[f64]) -> Result<Pose> {
        if joints.len() > DOF {
            return Err(eyre::eyre!(
                "Got {} joint angles for a {}-link chain",
                joints.len(),
                DOF
            ));
        }

        Ok(self.chain_pose(joints))
    }

    /// Frame 3, the base the spherical wrist rotates in.
    pub fn arm_frame(&self, arm: &[f64; 3]) -> Pose {
        self.chain_pose(arm)
    }

    /// Base frame followed by every link frame, flange last.
    pub fn link_transforms(&self, joints: &Joints) -> Vec<Pose> {
        let mut transforms = Vec::with_capacity(DOF + 1);
        let mut current = Pose::identity();
        transforms.push(current);

        for (dh, &q) in self.dh_params.iter().zip(joints.iter()) {
            current = current * dh_transformation(dh, q);
            transforms.push(current);
        }

        transforms
    }

    /// DH `d` of link `index` (0-based).
    pub fn link_offset_length(&self, index: usize) -> Option<f64> {
        self.dh_params.get(index).map(|dh| dh.d)
    }

    /// Distance from the wrist center to the flange along the flange z axis.
    pub fn flange_length(&self) -> f64 {
        self.dh_params[DOF - 1].d
    }

    // Leading links only; callers bound `joints.len()` by DOF
    fn chain_pose(&self, joints: &[f64]) -> Pose {
        self.dh_params
            .iter()
            .zip(joints.iter())
            .fold(Pose::identity(), |pose, (dh, &q)| pose * dh_transformation(dh, q))
    }
}

fn dh_transformation(dh: &DHParameter, q: f64) -> Pose {
    let theta = q + dh.theta;
    let cos_theta = theta.cos();
    let sin_theta = theta.sin();
    let cos_alpha = dh.alpha.cos();
    let sin_alpha = dh.alpha.sin();

    #[rustfmt::skip]
    let rotation = Matrix3::new(
        cos_theta, -sin_theta * cos_alpha,  sin_theta * sin_alpha,
        sin_theta,  cos_theta * cos_alpha, -cos_theta * sin_alpha,
        0.0,        sin_alpha,              cos_alpha,
    );
    let translation = Vector3::new(dh.a * cos_theta, dh.a * sin_theta, dh.d);

    Pose::from_parts(rotation, translation)
}
