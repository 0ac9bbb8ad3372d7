use crate::types::{Pose, ToolConfig};

/// Rigid tool mounted on the flange.
///
/// `offset` is the tool tip expressed in the flange frame. Its inverse is
/// computed once here because the mounting never changes.
#[derive(Debug, Clone, Copy)]
pub struct ToolTransform {
    offset: Pose,
    inverse_offset: Pose,
}

impl ToolTransform {
    pub fn new(offset: Pose) -> Self {
        Self {
            offset,
            inverse_offset: offset.inverse(),
        }
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(config.offset_pose())
    }

    /// Flange only, no tool.
    pub fn none() -> Self {
        Self::new(Pose::identity())
    }

    pub fn offset(&self) -> &Pose {
        &self.offset
    }

    /// `T_base_tool = T_base_flange · T_flange_tool`
    pub fn forward(&self, flange_pose: &Pose) -> Pose {
        *flange_pose * self.offset
    }

    /// `T_base_flange = T_base_tool · T_flange_tool⁻¹`
    pub fn backward(&self, tool_pose: &Pose) -> Pose {
        *tool_pose * self.inverse_offset
    }
}
