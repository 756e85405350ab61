mod f32_ext;
mod vec3_ext;

use core::ops;

use glam::{vec2, Vec2, Vec4};
use spirv_std::Image;

pub use self::f32_ext::*;
pub use self::vec3_ext::*;

pub type Tex<'a> = &'a Image!(2D, type = f32, sampled);
pub type TexRgba16<'a> = &'a Image!(2D, format = rgba16f, sampled = false);
pub type TexRgba32<'a> = &'a Image!(2D, format = rgba32f, sampled = false);

pub fn lerp<T>(a: T, b: T, t: f32) -> T
where
    T: ops::Add<Output = T>,
    T: ops::Sub<Output = T>,
    T: ops::Mul<f32, Output = T>,
    T: Copy,
{
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Hermite interpolation between `edge0` and `edge1`, GLSL-style.
///
/// Infinite `x` saturates, which the range checks rely on when two distances
/// are equal.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).saturate();

    t * t * (3.0 - 2.0 * t)
}

/// Returns clip-space position of given vertex of a triangle covering the
/// entire screen.
pub fn full_screen_triangle(vert_idx: i32) -> Vec4 {
    let uv = vec2(((vert_idx << 1) & 2) as f32, (vert_idx & 2) as f32);
    let pos = 2.0 * uv - Vec2::ONE;

    pos.extend(0.0).extend(1.0)
}
