pub mod kinematics;
pub mod motion;
pub mod orientation;
pub mod planner;
pub mod position_solver;
pub mod tool;
pub mod logging;

pub use kinematics::*;
pub use motion::*;
pub use orientation::*;
pub use planner::*;
pub use position_solver::*;
pub use tool::*;
pub use logging::*;
