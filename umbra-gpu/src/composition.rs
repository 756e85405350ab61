use glam::{ivec2, UVec2, Vec3, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{lerp, smoothstep, Camera, CompositionPassParams, Vec3Ext};

/// How the final image is put together.
pub struct RenderMode;

impl RenderMode {
    pub const COMBINED: u32 = 0;
    pub const AO_ONLY: u32 = 1;
    pub const NO_AO: u32 = 2;
    pub const SPLIT: u32 = 3;
    pub const SPLIT_AO: u32 = 4;
}

/// Fog models understood by the compositor.
pub struct Fog;

impl Fog {
    pub const NONE: u32 = 0;
    pub const LINEAR: u32 = 1;
    pub const EXPONENTIAL_SQUARED: u32 = 2;
}

/// Coverage of transparent surfaces at a pixel.
#[derive(Clone, Copy, Default)]
pub struct Transparency {
    /// Alpha of transparent objects that don't write depth
    pub no_depth_write_alpha: f32,

    /// Alpha of transparent objects that write depth
    pub depth_write_alpha: f32,

    /// Whether the depth-writing transparent object is what the depth buffer
    /// sees at this pixel
    pub depth_write_on_top: bool,
}

/// Upsamples half-resolution occlusion, preferring low-resolution texels whose
/// distance matches the full-resolution one.
///
/// `distance` returns linear depth of given low-resolution texel.
pub fn upsample(
    pos: UVec2,
    full_distance: f32,
    low_size: UVec2,
    occlusion: impl Fn(UVec2) -> f32,
    distance: impl Fn(UVec2) -> f32,
) -> f32 {
    const EPSILON: f32 = 0.0001;

    let p = (pos.as_vec2() + 0.5) * 0.5 - 0.5;
    let base = p.floor();
    let f = p - base;
    let base = base.as_ivec2();

    let offsets = [ivec2(0, 0), ivec2(1, 0), ivec2(0, 1), ivec2(1, 1)];

    let bilinear = [
        (1.0 - f.x) * (1.0 - f.y),
        f.x * (1.0 - f.y),
        (1.0 - f.x) * f.y,
        f.x * f.y,
    ];

    let mut sum = 0.0;
    let mut weights = 0.0;
    let mut i = 0;

    while i < 4 {
        let tap = Camera::clamp(low_size, base + offsets[i]);
        let delta = (distance(tap) - full_distance).abs() / full_distance;
        let weight = bilinear[i] / (EPSILON + delta);

        sum += occlusion(tap) * weight;
        weights += weight;
        i += 1;
    }

    if weights > 0.0 {
        sum / weights
    } else {
        occlusion(Camera::clamp(low_size, (pos / 2).as_ivec2()))
    }
}

/// Turns raw occlusion into the final shading factor.
pub fn shade_occlusion(
    params: &CompositionPassParams,
    occlusion: f32,
    distance: f32,
    transparency: Transparency,
) -> f32 {
    let mut ao = occlusion.max(0.0).powf(params.intensity());

    if params.ao_tones > 0.0 {
        ao = (ao * params.ao_tones).ceil() / params.ao_tones;
    }

    let fog = fog_factor(params, distance);

    ao = lerp(ao, 1.0, fog);

    if params.has(CompositionPassParams::FLAG_TRANSPARENCY) {
        ao = lerp(ao, 1.0, transparency.no_depth_write_alpha);

        if transparency.depth_write_on_top {
            ao = lerp(1.0, ao, transparency.depth_write_alpha);
        }
    }

    ao
}

fn fog_factor(params: &CompositionPassParams, distance: f32) -> f32 {
    let kind = params.fog.x as u32;

    if kind == Fog::LINEAR {
        smoothstep(params.fog.y, params.fog.z, distance)
    } else if kind == Fog::EXPONENTIAL_SQUARED {
        let density = params.fog.w;

        1.0 - (-density * density * distance * distance).exp()
    } else {
        0.0
    }
}

/// Puts given shading factor onto the scene's color, according to the render
/// mode.
///
/// `x` is the pixel's horizontal position, used by split modes.
pub fn compose(
    params: &CompositionPassParams,
    scene: Vec3,
    ao: f32,
    x: u32,
    width: u32,
) -> Vec3 {
    let tint = params.color.xyz();

    let combined = if params.has(CompositionPassParams::FLAG_COLOR_MULTIPLY) {
        scene * lerp(tint, Vec3::ONE, ao)
    } else {
        lerp(tint, scene, ao)
    };

    let ao_only = lerp(tint, Vec3::ONE, ao);
    let half = width / 2;

    let color = if params.render_mode == RenderMode::AO_ONLY {
        ao_only
    } else if params.render_mode == RenderMode::NO_AO {
        scene
    } else if params.render_mode == RenderMode::SPLIT
        || params.render_mode == RenderMode::SPLIT_AO
    {
        if x == half {
            Vec3::ONE
        } else if x < half {
            if params.render_mode == RenderMode::SPLIT {
                combined
            } else {
                ao_only
            }
        } else if params.render_mode == RenderMode::SPLIT {
            scene
        } else {
            combined
        }
    } else {
        combined
    };

    if params.has(CompositionPassParams::FLAG_GAMMA_CORRECTION) {
        color.max(Vec3::ZERO).linear_to_srgb()
    } else {
        color
    }
}

/// Converts pixel of the full-resolution screen into the nearest pixel of the
/// half-resolution buffer.
pub fn half_res_pos(pos: UVec2, low_size: UVec2) -> UVec2 {
    Camera::clamp(low_size, (pos / 2).as_ivec2())
}
