use core::f32::consts::PI;

use glam::{vec2, Mat2, UVec2, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    smoothstep, view_pos, Camera, DenoisePassParams, DepthModel, F32Ext,
};

/// Golden ratio's fractional part; rotates the Poisson disk a bit further at
/// each iteration.
const ITERATION_ROTATION: f32 = 0.618034;

/// Depth-aware Poisson-disk blur, applied iteratively over the occlusion
/// buffer.
pub struct Denoiser<'a, D, O>
where
    D: Fn(UVec2) -> f32,
    O: Fn(UVec2) -> Vec4,
{
    pub camera: &'a Camera,
    pub model: DepthModel,
    pub params: &'a DenoisePassParams,
    pub samples: &'a [Vec4],
    pub sample_count: u32,
    pub depth: D,
    pub occlusion: O,
}

impl<'a, D, O> Denoiser<'a, D, O>
where
    D: Fn(UVec2) -> f32,
    O: Fn(UVec2) -> Vec4,
{
    pub fn denoise(&self, screen_pos: UVec2, noise: Vec4) -> Vec4 {
        let center = (self.occlusion)(screen_pos);
        let depth = (self.depth)(screen_pos);

        if self.model.is_sky(depth) {
            return center;
        }

        let resolution = self.params.resolution;
        let size = resolution.as_uvec2();
        let center_dist = self.model.buffer_to_linear(depth);

        let radius = if self.params.is_screen_space() {
            let uv = (screen_pos.as_vec2() + 0.5) / resolution;
            let offset = vec2(self.params.ao_radius, 0.0) / resolution;
            let pos = view_pos(self.camera, self.model, uv, depth);

            pos.distance(view_pos(self.camera, self.model, uv + offset, depth))
        } else {
            self.params.ao_radius
        };

        let falloff = if self.params.is_screen_space() {
            radius * self.params.distance_falloff
        } else {
            radius * self.params.distance_falloff * 0.2
        };

        let angle = (noise.x
            + (self.params.iteration as f32) * ITERATION_ROTATION)
            .fract_floor()
            * 2.0
            * PI;

        let rotation = Mat2::from_angle(angle);

        let mut occlusion = center.x;
        let mut weights = 1.0;
        let mut i = 0;

        while i < self.sample_count {
            let offset = rotation * self.samples[i as usize].truncate().truncate();
            let tap = screen_pos.as_vec2() + 0.5 + offset * self.params.radius;
            let tap = tap.floor().as_ivec2();

            i += 1;

            if !Camera::contains(size, tap) {
                continue;
            }

            let tap = tap.as_uvec2();
            let tap_depth = (self.depth)(tap);

            if self.model.is_sky(tap_depth) {
                continue;
            }

            let delta = self.model.buffer_to_linear(tap_depth) - center_dist;

            let weight = if self.params.distance_falloff > 0.0 {
                smoothstep(0.0, 1.0, falloff / delta.abs())
            } else {
                1.0
            };

            occlusion += (self.occlusion)(tap).x * weight;
            weights += weight;
        }

        Vec4::new(occlusion / weights, center.y, center.z, center.w)
    }
}

/// Returns which of the two ping-pong buffers holds the result after given
/// number of blur iterations, `false` being the estimator's output.
pub fn denoised_buffer(iterations: u32) -> bool {
    iterations % 2 == 1
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3, vec4, Mat4};

    use super::*;
    use crate::poisson_disk_sample;

    const SIZE: UVec2 = uvec2(16, 8);

    fn camera() -> Camera {
        let projection = Mat4::perspective_rh(1.0, 2.0, 0.1, 100.0);

        Camera {
            projection,
            projection_inv: projection.inverse(),
            clip: vec4(0.1, 100.0, 0.0, 0.0),
            ..Default::default()
        }
    }

    fn depth_of(camera: &Camera, distance: f32) -> f32 {
        let clip = camera.view_to_clip(vec3(0.0, 0.0, -distance));

        clip.z / clip.w
    }

    /// Runs given number of blur iterations over a CPU image, ping-ponging
    /// between two buffers the same way the GPU passes do.
    fn blur(
        camera: &Camera,
        depths: &[f32],
        input: Vec<Vec4>,
        iterations: u32,
        distance_falloff: f32,
    ) -> Vec<Vec4> {
        let samples: Vec<_> = (0..8)
            .map(|k| poisson_disk_sample(k, 8).extend(0.0).extend(0.0))
            .collect();

        let mut buffers = [input.clone(), input];

        for iteration in 0..iterations {
            let src = denoised_buffer(iteration) as usize;
            let params = DenoisePassParams {
                resolution: SIZE.as_vec2(),
                radius: 3.0,
                ao_radius: 5.0,
                distance_falloff,
                iteration,
                ..Default::default()
            };

            let denoiser = Denoiser {
                camera,
                model: DepthModel::new(camera, DepthModel::LINEAR, false),
                params: &params,
                samples: &samples,
                sample_count: 8,
                depth: |pos: UVec2| depths[(pos.y * SIZE.x + pos.x) as usize],
                occlusion: |pos: UVec2| {
                    buffers[src][(pos.y * SIZE.x + pos.x) as usize]
                },
            };

            let output: Vec<_> = (0..SIZE.y)
                .flat_map(|y| (0..SIZE.x).map(move |x| uvec2(x, y)))
                .map(|pos| denoiser.denoise(pos, Vec4::splat(0.3)))
                .collect();

            buffers[1 - src] = output;
        }

        buffers[denoised_buffer(iterations) as usize].clone()
    }

    /// Left half: near wall, fully occluded; right half: far wall, not
    /// occluded at all.
    fn split_scene(camera: &Camera) -> (Vec<f32>, Vec<Vec4>) {
        let mut depths = Vec::new();
        let mut occlusion = Vec::new();

        for _ in 0..SIZE.y {
            for x in 0..SIZE.x {
                if x < SIZE.x / 2 {
                    depths.push(depth_of(camera, 5.0));
                    occlusion.push(vec4(0.0, 0.5, 0.5, 1.0));
                } else {
                    depths.push(depth_of(camera, 50.0));
                    occlusion.push(vec4(1.0, 0.5, 0.5, 1.0));
                }
            }
        }

        (depths, occlusion)
    }

    #[test]
    fn zero_iterations() {
        let camera = camera();
        let (depths, occlusion) = split_scene(&camera);

        assert_eq!(blur(&camera, &depths, occlusion.clone(), 0, 1.0), occlusion);
        assert!(!denoised_buffer(0));
        assert!(denoised_buffer(1));
        assert!(!denoised_buffer(2));
    }

    #[test]
    fn constant_input_stays_constant() {
        let camera = camera();
        let depths = vec![depth_of(&camera, 10.0); (SIZE.x * SIZE.y) as usize];
        let occlusion = vec![vec4(0.4, 0.5, 0.5, 1.0); depths.len()];

        for value in blur(&camera, &depths, occlusion, 3, 1.0) {
            assert!((value.x - 0.4).abs() < 1e-5, "{value:?}");
        }
    }

    #[test]
    fn does_not_bleed_across_edges() {
        let camera = camera();
        let (depths, occlusion) = split_scene(&camera);
        let edge = (4 * SIZE.x + SIZE.x / 2) as usize;

        let blurred = blur(&camera, &depths, occlusion.clone(), 2, 1.0);

        assert!(blurred[edge].x > 0.99, "{:?}", blurred[edge]);
        assert!(blurred[edge - 1].x < 0.01, "{:?}", blurred[edge - 1]);

        // Without the range check the edge gets smeared
        let blurred = blur(&camera, &depths, occlusion, 2, 0.0);

        assert!(blurred[edge].x < 0.9, "{:?}", blurred[edge]);
    }
}
