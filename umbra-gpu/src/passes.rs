use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct OcclusionPassParams {
    /// Size of the occlusion buffer (half of the screen in half-res mode)
    pub resolution: Vec2,
    pub radius: f32,
    pub distance_falloff: f32,
    pub bias_offset: f32,
    pub bias_multiplier: f32,
    pub frame: u32,
    pub screen_space_radius: u32,
}

impl OcclusionPassParams {
    pub fn is_screen_space(&self) -> bool {
        self.screen_space_radius != 0
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct DenoisePassParams {
    pub resolution: Vec2,

    /// Blur radius, in pixels
    pub radius: f32,

    /// Occlusion radius; used to derive the range-check falloff
    pub ao_radius: f32,
    pub distance_falloff: f32,
    pub iteration: u32,
    pub frame: u32,
    pub screen_space_radius: u32,
}

impl DenoisePassParams {
    pub fn is_screen_space(&self) -> bool {
        self.screen_space_radius != 0
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct AccumulationPassParams {
    /// Weight of the current frame, `1 / (frame + 1)`
    pub weight: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct DepthCopyPassParams {
    pub depth_convention: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct CompositionPassParams {
    /// xyz - occlusion color (linear)
    /// w - intensity
    pub color: Vec4,

    /// x - fog kind (see `Fog::*`)
    /// y - linear fog's near distance
    /// z - linear fog's far distance
    /// w - exponential fog's density
    pub fog: Vec4,

    /// Size of the accumulation buffer
    pub ao_resolution: Vec2,
    pub ao_tones: f32,
    pub render_mode: u32,
    pub flags: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

impl CompositionPassParams {
    pub const FLAG_COLOR_MULTIPLY: u32 = 1;
    pub const FLAG_GAMMA_CORRECTION: u32 = 1 << 1;
    pub const FLAG_TRANSPARENCY: u32 = 1 << 2;

    pub fn intensity(&self) -> f32 {
        self.color.w
    }

    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}
