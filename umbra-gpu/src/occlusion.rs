use core::f32::consts::PI;

use glam::{
    ivec2, vec2, vec4, IVec2, Mat3, UVec2, Vec3, Vec4, Vec4Swizzles,
};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    smoothstep, view_pos, Camera, DepthModel, F32Ext, OcclusionPassParams,
};

/// Horizon-based ambient occlusion estimator.
///
/// Works in view-space: each sample is a point laid inside a hemisphere
/// oriented along the surface's normal, projected back onto the screen and
/// compared against what the depth buffer says is visible there.
pub struct OcclusionEstimator<'a, D, N>
where
    D: Fn(UVec2) -> f32,
    N: Fn(UVec2, Vec3) -> Vec3,
{
    pub camera: &'a Camera,
    pub model: DepthModel,
    pub params: &'a OcclusionPassParams,
    pub samples: &'a [Vec4],
    pub sample_count: u32,

    /// Returns depth at given pixel of the occlusion-resolution depth buffer
    pub depth: D,

    /// Returns normal at given pixel, given its view-space position
    pub normal: N,
}

impl<'a, D, N> OcclusionEstimator<'a, D, N>
where
    D: Fn(UVec2) -> f32,
    N: Fn(UVec2, Vec3) -> Vec3,
{
    /// Returns `(occlusion, normal * 0.5 + 0.5)` for given pixel.
    ///
    /// `noise` is a frame-jittered blue-noise texel.
    pub fn estimate(&self, screen_pos: UVec2, noise: Vec4) -> Vec4 {
        let depth = (self.depth)(screen_pos);

        if self.model.is_sky(depth) {
            return Vec4::ONE;
        }

        let resolution = self.params.resolution;
        let uv = (screen_pos.as_vec2() + 0.5) / resolution;
        let pos = view_pos(self.camera, self.model, uv, depth);
        let normal = (self.normal)(screen_pos, pos);

        let tbn = {
            let helper = if normal.dot(Vec3::Y) > 0.99 {
                Vec3::X
            } else {
                Vec3::Y
            };

            let tangent = helper.cross(normal).normalize();
            let bitangent = normal.cross(tangent);

            Mat3::from_cols(tangent, bitangent, normal)
                * Mat3::from_rotation_z(noise.x * 2.0 * PI)
        };

        let radius = if self.params.is_screen_space() {
            let offset = vec2(self.params.radius, 0.0) / resolution;

            pos.distance(view_pos(self.camera, self.model, uv + offset, depth))
        } else {
            self.params.radius
        };

        let falloff = if self.params.is_screen_space() {
            radius * self.params.distance_falloff
        } else {
            radius * self.params.distance_falloff * 0.2
        };

        let bias = self.bias(screen_pos, pos, radius, falloff);

        let mut occluded = 0.0;
        let mut total = 0.0;
        let mut offset_move = noise.y;
        let offset_step = 1.0 / (self.sample_count as f32);
        let mut i = 0;

        while i < self.sample_count {
            let dir = tbn * self.samples[i as usize].xyz();
            let t = offset_move.fract_floor();
            let sample_pos = pos + radius * t * dir;

            offset_move += offset_step;
            i += 1;

            let clip = self.camera.view_to_clip(sample_pos);
            let ndc = clip.xyz() / clip.w;
            let sample_uv = Camera::ndc_to_uv(ndc.xy());

            let is_valid = clip.w > 0.0
                && sample_uv.x > 0.0
                && sample_uv.x < 1.0
                && sample_uv.y > 0.0
                && sample_uv.y < 1.0
                && ndc.z > 0.0
                && ndc.z < 1.0;

            if !is_valid {
                continue;
            }

            total += 1.0;

            let sample_px = (sample_uv * resolution).as_uvec2();

            if sample_px == screen_pos {
                continue;
            }

            let sample_depth = (self.depth)(sample_px);
            let dist_sample = self.model.buffer_to_linear(sample_depth);
            let dist_world = self.model.ndc_to_linear(ndc.z);

            let is_occluder = dist_sample != dist_world
                && sample_depth != depth
                && dist_world >= dist_sample + bias;

            if is_occluder {
                occluded += self.range_check(falloff, dist_sample - dist_world);
            }
        }

        let occlusion = (1.0 - occluded / total.max(1.0)).saturate();

        vec4(
            occlusion,
            normal.x * 0.5 + 0.5,
            normal.y * 0.5 + 0.5,
            normal.z * 0.5 + 0.5,
        )
    }

    /// Weight of an occluder lying `delta` units away from the sample point;
    /// zero falloff disables the check.
    fn range_check(&self, falloff: f32, delta: f32) -> f32 {
        if self.params.distance_falloff > 0.0 {
            smoothstep(0.0, 1.0, falloff / delta.abs())
        } else {
            1.0
        }
    }

    /// Returns bias proportional to how fast the distance to camera changes
    /// around given pixel, so that steep surfaces don't occlude themselves.
    fn bias(&self, screen_pos: UVec2, pos: Vec3, radius: f32, falloff: f32) -> f32 {
        if self.params.bias_multiplier == 0.0 {
            return self.params.bias_offset;
        }

        let dist = pos.length();
        let dx = self.distance_at(screen_pos.as_ivec2() + ivec2(1, 0)) - dist;
        let dy = self.distance_at(screen_pos.as_ivec2() + ivec2(0, 1)) - dist;
        let derivative = dx.abs() + dy.abs();

        let bias = (falloff * 0.1).min(0.1) / self.model.near * derivative
            / radius;

        self.params.bias_offset + self.params.bias_multiplier * bias
    }

    fn distance_at(&self, pos: IVec2) -> f32 {
        let resolution = self.params.resolution;
        let pos = Camera::clamp(resolution.as_uvec2(), pos);
        let uv = (pos.as_vec2() + 0.5) / resolution;
        let depth = (self.depth)(pos);

        view_pos(self.camera, self.model, uv, depth).length()
    }
}

/// Samples `normal * 0.5 + 0.5` as encoded by the estimator back into a
/// normal.
pub fn decode_normal(encoded: Vec4) -> Vec3 {
    (encoded.yzw() * 2.0 - Vec3::ONE).normalize()
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use approx::assert_relative_eq;
    use glam::uvec2;

    use super::*;
    use crate::test_scene::TestScene;
    use crate::{hemisphere_sample, reconstruct_normal};

    fn samples(n: u32) -> Vec<Vec4> {
        (0..n).map(|k| hemisphere_sample(k, n).extend(0.0)).collect()
    }

    fn params(scene: &TestScene, distance_falloff: f32) -> OcclusionPassParams {
        OcclusionPassParams {
            resolution: scene.size.as_vec2(),
            radius: 5.0,
            distance_falloff,
            ..Default::default()
        }
    }

    fn estimate_all(scene: &TestScene, params: &OcclusionPassParams) -> Vec<f32> {
        let samples = samples(16);
        let size = scene.size;

        let estimator = OcclusionEstimator {
            camera: &scene.camera,
            model: scene.model,
            params,
            samples: &samples,
            sample_count: 16,
            depth: |pos: UVec2| scene.depth(pos),
            normal: |pos: UVec2, _| {
                reconstruct_normal(
                    &scene.camera,
                    scene.model,
                    size.as_vec2(),
                    pos.as_ivec2(),
                    |pos| scene.depth(Camera::clamp(size, pos)),
                )
            },
        };

        let mut out = Vec::new();

        for y in 0..size.y {
            for x in 0..size.x {
                let pos = uvec2(x, y);

                out.push(estimator.estimate(pos, scene.noise(pos)).x);
            }
        }

        out
    }

    fn mean_around(scene: &TestScene, occlusion: &[f32], world: Vec3) -> f32 {
        let center = scene.project(world).as_ivec2();
        let mut sum = 0.0;
        let mut count = 0.0;

        for dy in -2..=2 {
            for dx in -2..=2 {
                let pos = (center + ivec2(dx, dy)).as_uvec2();

                sum += occlusion[(pos.y * scene.size.x + pos.x) as usize];
                count += 1.0;
            }
        }

        sum / count
    }

    fn stats(values: &[f32]) -> (f32, f32) {
        let mean = values.iter().sum::<f32>() / (values.len() as f32);

        let variance = values.iter().map(|v| (v - mean).sqr()).sum::<f32>()
            / (values.len() as f32);

        (mean, variance)
    }

    #[test]
    fn sky_skips_sampling() {
        let scene = TestScene::new();
        let params = params(&scene, 1.0);
        let samples = samples(16);
        let fetches = Cell::new(0);

        let estimator = OcclusionEstimator {
            camera: &scene.camera,
            model: scene.model,
            params: &params,
            samples: &samples,
            sample_count: 16,
            depth: |_: UVec2| {
                fetches.set(fetches.get() + 1);
                1.0
            },
            normal: |_: UVec2, _: Vec3| -> Vec3 {
                panic!("normal shouldn't be needed for sky")
            },
        };

        let out = estimator.estimate(uvec2(3, 3), Vec4::splat(0.5));

        assert_eq!(out, Vec4::ONE);
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn degenerate_samples() {
        // Camera looks at a wall lying right at the near plane, so samples
        // either land behind the camera or hit the wall itself
        let scene = TestScene::new();
        let params = params(&scene, 1.0);
        let samples = samples(16);
        let wall = 0.0000001;

        let estimator = OcclusionEstimator {
            camera: &scene.camera,
            model: scene.model,
            params: &params,
            samples: &samples,
            sample_count: 16,
            depth: |_: UVec2| wall,
            normal: |_: UVec2, _: Vec3| Vec3::Z,
        };

        let out = estimator.estimate(uvec2(0, 0), Vec4::splat(0.5));

        assert_relative_eq!(out.x, 1.0);
        assert!(decode_normal(out).abs_diff_eq(Vec3::Z, 0.001));
    }

    #[test]
    fn contact_is_darker_than_open_ground() {
        let scene = TestScene::new();
        let occlusion = estimate_all(&scene, &params(&scene, 1.0));

        let contact =
            mean_around(&scene, &occlusion, scene.contact_point());

        let open = mean_around(&scene, &occlusion, scene.open_point());

        assert!(
            contact + 0.1 < open,
            "contact={contact}, open={open}"
        );

        assert!(open > 0.8, "open={open}");
    }

    #[test]
    fn zero_falloff_bleeds() {
        let scene = TestScene::new();
        let with_falloff = estimate_all(&scene, &params(&scene, 1.0));
        let without_falloff = estimate_all(&scene, &params(&scene, 0.0));

        for (a, b) in with_falloff.iter().zip(&without_falloff) {
            assert!(b <= a, "{b} > {a}");
        }

        let (mean_a, var_a) = stats(&with_falloff);
        let (mean_b, var_b) = stats(&without_falloff);

        assert!(mean_b < mean_a, "{mean_b} >= {mean_a}");
        assert!((var_a - var_b).abs() > 1e-6, "{var_a} ~ {var_b}");
    }
}
