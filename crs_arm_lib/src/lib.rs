//! # CRS Arm Library
//!
//! Kinematics for a 6-DOF CRS arm carrying a rigid tool: forward kinematics,
//! decoupled closed-form inverse kinematics for the tool tip, joint-limit
//! filtering and nearest-solution selection, plus the motion cycle that ties
//! them to a joint-state source and a motion dispatcher.

pub mod types;
pub mod utils;

// Re-export everything for convenience
pub use types::*;
pub use utils::*;
