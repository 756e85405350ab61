use bytemuck::{Pod, Zeroable};

use crate::{Camera, DepthModel};

/// Describes a pipeline variant; uploaded once per variant and never changed
/// afterwards.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Variant {
    /// See: `DepthModel::LINEAR` etc.
    pub depth_convention: u32,
    pub ortho: u32,
    pub sample_count: u32,
    pub flags: u32,
}

impl Variant {
    /// Occlusion is computed at half of the screen's resolution.
    pub const FLAG_HALF_RES: u32 = 1;

    /// Half-resolution occlusion is upsampled with depth-aware weights.
    pub const FLAG_DEPTH_AWARE_UPSAMPLING: u32 = 1 << 1;

    pub fn depth_model(&self, camera: &Camera) -> DepthModel {
        DepthModel::new(camera, self.depth_convention, self.ortho != 0)
    }

    pub fn is_half_res(&self) -> bool {
        self.flags & Self::FLAG_HALF_RES != 0
    }

    pub fn is_depth_aware_upsampling(&self) -> bool {
        self.flags & Self::FLAG_DEPTH_AWARE_UPSAMPLING != 0
    }
}
