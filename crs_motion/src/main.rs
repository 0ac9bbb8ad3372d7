use clap::{Parser, Subcommand};
use crs_arm_lib::{
    init_tracing, joints_from_slice, move_relative, move_to_position, ArmConfig, Joints,
    MotionPlanner, MotionReport, PlanError, SimulatedArm,
};
use eyre::Result;
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "crs_motion")]
#[command(about = "Plan and execute Cartesian tool moves for the CRS arm")]
struct Cli {
    /// Arm configuration file (falls back to $ARM_CONFIG, then config/crs97.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Comma-separated start joints in radians; defaults to the configured home pose
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    start: Option<Vec<f64>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and validate the configuration
    Check,
    /// Tool-tip pose for a joint configuration
    Fk {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        joints: Vec<f64>,
    },
    /// Move the tool tip to an absolute position, keeping its orientation
    MoveTo {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        #[arg(long, allow_hyphen_values = true)]
        z: f64,
    },
    /// Shift the tool tip in the base frame, keeping its orientation
    MoveRelative {
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dx: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dy: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dz: f64,
    },
}

#[derive(Serialize)]
struct ToolPoseOutput {
    joints: Joints,
    position: [f64; 3],
    /// roll, pitch, yaw in radians
    orientation: [f64; 3],
}

fn main() -> Result<()> {
    let _guard = init_tracing();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("ARM_CONFIG").ok())
        .unwrap_or_else(|| "config/crs97.toml".to_string());

    info!("Loading arm config from: {}", config_path);
    let config = ArmConfig::load_from_file(&config_path)
        .map_err(|e| eyre::eyre!("Failed to load arm config from {}: {}", config_path, e))?;
    let planner = MotionPlanner::from_config(&config)?;

    let start = match &cli.start {
        Some(values) => joints_from_slice(values)?,
        None => config.home()?,
    };

    match cli.command {
        Command::Check => {
            check_config(&config, &planner);
            Ok(())
        }
        Command::Fk { joints } => {
            let joints = joints_from_slice(&joints)?;
            let pose = planner.forward(&joints);
            let rpy = pose.euler_angles();
            print_json(&ToolPoseOutput {
                joints,
                position: [pose.translation.x, pose.translation.y, pose.translation.z],
                orientation: [rpy.x, rpy.y, rpy.z],
            })
        }
        Command::MoveTo { x, y, z } => {
            let mut arm = SimulatedArm::new(start);
            finish_motion(move_to_position(&planner, &mut arm, [x, y, z]))
        }
        Command::MoveRelative { dx, dy, dz } => {
            let mut arm = SimulatedArm::new(start);
            finish_motion(move_relative(&planner, &mut arm, [dx, dy, dz]))
        }
    }
}

fn check_config(config: &ArmConfig, planner: &MotionPlanner) {
    info!("Arm configuration {} is valid: {} DOF", config.name, config.dof);
    for (i, dh) in planner.chain().dh_parameters().iter().enumerate() {
        info!(
            "  link {}: a={:.4} alpha={:.4} d={:.4} theta={:.4}",
            i + 1,
            dh.a,
            dh.alpha,
            dh.d,
            dh.theta
        );
    }
    for (i, limit) in planner.limits().as_slice().iter().enumerate() {
        info!(
            "  joint {} limits: [{:.1}, {:.1}] deg",
            i + 1,
            limit.min_angle.to_degrees(),
            limit.max_angle.to_degrees()
        );
    }
    info!("  tool offset: {:?}", config.tool.offset);
}

fn finish_motion(outcome: Result<MotionReport>) -> Result<()> {
    match outcome {
        Ok(report) => {
            info!(
                "Motion complete, joint-space distance {:.4} rad",
                report.joint_distance
            );
            print_json(&report)
        }
        Err(e) => {
            match e.downcast_ref::<PlanError>() {
                Some(PlanError::Unreachable) => {
                    error!("No inverse kinematics solution: the target is out of reach, re-pose it")
                }
                Some(PlanError::OutOfLimits { candidates }) => error!(
                    "Found {} solutions but all violate joint limits: approach the target differently",
                    candidates
                ),
                Some(PlanError::InvalidPose) => {
                    error!("Target pose is not a rigid transform, check its rotation")
                }
                None => error!("Motion failed: {}", e),
            }
            Err(e)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
