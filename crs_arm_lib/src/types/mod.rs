pub mod config;
pub mod joint_state;
pub mod pose;

pub use config::*;
pub use joint_state::*;
pub use pose::*;
