use crate::types::{JointLimit, JointLimits, Joints, Pose, DOF};
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fs;

const WRIST_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmConfig {
    pub name: String,
    pub dof: usize,
    pub joint_limits: Vec<JointLimit>,
    pub kinematics: KinematicsConfig,
    pub tool: ToolConfig,
    pub home_joints: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicsConfig {
    pub dh_parameters: Vec<DHParameter>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DHParameter {
    pub a: f64,      // link length
    pub alpha: f64,  // link twist
    pub d: f64,      // link offset
    pub theta: f64,  // joint angle offset
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool tip translation in the flange frame (m)
    pub offset: [f64; 3],
}

impl DHParameter {
    pub fn new(a: f64, alpha: f64, d: f64, theta: f64) -> Self {
        Self { a, alpha, d, theta }
    }
}

impl ToolConfig {
    pub fn offset_pose(&self) -> Pose {
        Pose::from_translation(self.offset[0], self.offset[1], self.offset[2])
    }
}

impl ArmConfig {
    /// CRS97 arm with the 135 mm tool, matching `config/crs97.toml`.
    pub fn crs97() -> Self {
        let deg = |value: f64| value.to_radians();

        Self {
            name: "CRS97".to_string(),
            dof: DOF,
            joint_limits: vec![
                JointLimit::new(deg(-175.0), deg(175.0)),
                JointLimit::new(deg(-90.0), deg(90.0)),
                JointLimit::new(deg(-110.0), deg(110.0)),
                JointLimit::new(deg(-180.0), deg(180.0)),
                JointLimit::new(deg(-105.0), deg(105.0)),
                JointLimit::new(deg(-180.0), deg(180.0)),
            ],
            kinematics: KinematicsConfig {
                dh_parameters: vec![
                    DHParameter::new(0.0, -FRAC_PI_2, 0.3302, 0.0),
                    DHParameter::new(0.3048, 0.0, 0.0, -FRAC_PI_2),
                    DHParameter::new(0.0, -FRAC_PI_2, 0.0, -FRAC_PI_2),
                    DHParameter::new(0.0, FRAC_PI_2, 0.3302, 0.0),
                    DHParameter::new(0.0, -FRAC_PI_2, 0.0, 0.0),
                    DHParameter::new(0.0, 0.0, 0.0762, 0.0),
                ],
            },
            tool: ToolConfig {
                offset: [0.135, 0.0, 0.0],
            },
            home_joints: vec![0.0, deg(20.0), deg(60.0), 0.0, deg(40.0), 0.0],
        }
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ArmConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dof != DOF {
            return Err(eyre::eyre!(
                "Only {}-DOF arms are supported, config declares {}",
                DOF,
                self.dof
            ));
        }

        if self.joint_limits.len() != self.dof {
            return Err(eyre::eyre!(
                "Joint limits count ({}) doesn't match DOF ({})",
                self.joint_limits.len(),
                self.dof
            ));
        }

        if self.kinematics.dh_parameters.len() != self.dof {
            return Err(eyre::eyre!(
                "DH parameters count ({}) doesn't match DOF ({})",
                self.kinematics.dh_parameters.len(),
                self.dof
            ));
        }

        if self.home_joints.len() != self.dof {
            return Err(eyre::eyre!(
                "Home joints count ({}) doesn't match DOF ({})",
                self.home_joints.len(),
                self.dof
            ));
        }

        for (i, limit) in self.joint_limits.iter().enumerate() {
            if !(limit.min_angle <= limit.max_angle) {
                return Err(eyre::eyre!(
                    "Joint {} limits [{:.3}, {:.3}] are inverted or not numbers",
                    i,
                    limit.min_angle,
                    limit.max_angle
                ));
            }
        }

        let wrist = &self.kinematics.dh_parameters[3..];
        if wrist.iter().any(|dh| dh.a != 0.0) || wrist[1].d != 0.0 {
            return Err(eyre::eyre!(
                "Joints 4-6 must form a spherical wrist (a4 = a5 = a6 = 0, d5 = 0)"
            ));
        }

        // The wrist solver inverts R36 = Rz(q4) · Ry(-q5) · Rz(q6)
        let near = |value: f64, want: f64| (value - want).abs() < WRIST_TOLERANCE;
        let twists = [FRAC_PI_2, -FRAC_PI_2, 0.0];
        for (i, (dh, twist)) in wrist.iter().zip(twists).enumerate() {
            if !near(dh.alpha, twist) || !near(dh.theta, 0.0) {
                return Err(eyre::eyre!(
                    "Joint {} must have alpha = {:.4} and no theta offset, got alpha = {:.4}, theta = {:.4}",
                    i + 4,
                    twist,
                    dh.alpha,
                    dh.theta
                ));
            }
        }

        if self.tool.offset.iter().any(|v| !v.is_finite()) {
            return Err(eyre::eyre!("Tool offset {:?} is not finite", self.tool.offset));
        }

        Ok(())
    }

    /// Call after [`ArmConfig::validate`].
    pub fn limits(&self) -> Result<JointLimits> {
        let limits: [JointLimit; DOF] = self
            .joint_limits
            .as_slice()
            .try_into()
            .map_err(|_| eyre::eyre!("Expected {} joint limits", DOF))?;
        Ok(JointLimits::new(limits))
    }

    pub fn home(&self) -> Result<Joints> {
        joints_from_slice(&self.home_joints)
    }
}

/// Converts a slice of exactly six angles into a joint configuration.
pub fn joints_from_slice(values: &[f64]) -> Result<Joints> {
    values.try_into().map_err(|_| {
        eyre::eyre!(
            "Expected {} joint values, got {}",
            DOF,
            values.len()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_is_valid() {
        let config = ArmConfig::crs97();

        assert!(config.validate().is_ok());
        assert!(config.limits().unwrap().contains(&config.home().unwrap()));
    }

    #[test]
    fn test_bundled_toml_matches_builtin() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/crs97.toml");
        let loaded = ArmConfig::load_from_file(path).unwrap();
        let builtin = ArmConfig::crs97();

        loaded.validate().unwrap();
        assert_eq!(loaded.name, builtin.name);
        assert_eq!(loaded.tool.offset, builtin.tool.offset);
        for (a, b) in loaded
            .kinematics
            .dh_parameters
            .iter()
            .zip(builtin.kinematics.dh_parameters.iter())
        {
            assert!((a.a - b.a).abs() < 1e-9);
            assert!((a.alpha - b.alpha).abs() < 1e-9);
            assert!((a.d - b.d).abs() < 1e-9);
            assert!((a.theta - b.theta).abs() < 1e-9);
        }
        for (a, b) in loaded.joint_limits.iter().zip(builtin.joint_limits.iter()) {
            assert!((a.min_angle - b.min_angle).abs() < 1e-9);
            assert!((a.max_angle - b.max_angle).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_wrong_limit_count() {
        let mut config = ArmConfig::crs97();
        config.joint_limits.pop();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_limits() {
        let mut config = ArmConfig::crs97();
        config.joint_limits[2] = JointLimit::new(1.0, -1.0);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_offset_wrist() {
        let mut config = ArmConfig::crs97();
        config.kinematics.dh_parameters[4].a = 0.01;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_flipped_wrist_twists() {
        let mut config = ArmConfig::crs97();
        config.kinematics.dh_parameters[3].alpha = -FRAC_PI_2;
        config.kinematics.dh_parameters[4].alpha = FRAC_PI_2;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_wrist_theta_offset() {
        let mut config = ArmConfig::crs97();
        config.kinematics.dh_parameters[5].theta = 0.3;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parses_toml() {
        let text = r#"
            name = "bench"
            dof = 6
            home_joints = [0.0, 0.0, 0.0, 0.0, 0.5, 0.0]

            [[joint_limits]]
            min_angle = -1.0
            max_angle = 1.0
            [[joint_limits]]
            min_angle = -1.0
            max_angle = 1.0
            [[joint_limits]]
            min_angle = -1.0
            max_angle = 1.0
            [[joint_limits]]
            min_angle = -1.0
            max_angle = 1.0
            [[joint_limits]]
            min_angle = -1.0
            max_angle = 1.0
            [[joint_limits]]
            min_angle = -1.0
            max_angle = 1.0

            [tool]
            offset = [0.0, 0.0, 0.1]

            [[kinematics.dh_parameters]]
            a = 0.0
            alpha = -1.5707963267948966
            d = 0.3
            theta = 0.0
            [[kinematics.dh_parameters]]
            a = 0.3
            alpha = 0.0
            d = 0.0
            theta = -1.5707963267948966
            [[kinematics.dh_parameters]]
            a = 0.0
            alpha = -1.5707963267948966
            d = 0.0
            theta = -1.5707963267948966
            [[kinematics.dh_parameters]]
            a = 0.0
            alpha = 1.5707963267948966
            d = 0.3
            theta = 0.0
            [[kinematics.dh_parameters]]
            a = 0.0
            alpha = -1.5707963267948966
            d = 0.0
            theta = 0.0
            [[kinematics.dh_parameters]]
            a = 0.0
            alpha = 0.0
            d = 0.05
            theta = 0.0
        "#;

        let config: ArmConfig = toml::from_str(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.tool.offset, [0.0, 0.0, 0.1]);
        assert_eq!(config.kinematics.dh_parameters[5].d, 0.05);
    }

    #[test]
    fn test_joints_from_slice_checks_length() {
        assert!(joints_from_slice(&[0.0; 6]).is_ok());
        assert!(joints_from_slice(&[0.0; 5]).is_err());
    }
}
