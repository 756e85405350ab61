use umbra_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &OcclusionPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1, uniform)] variant: &Variant,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)] samples: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 3)] blue_noise: Tex,
    #[spirv(descriptor_set = 0, binding = 4)] depth: Tex,
    #[spirv(descriptor_set = 0, binding = 5)] downsampled: Tex,
    #[spirv(descriptor_set = 1, binding = 0)] output: TexRgba16,
) {
    let screen_pos = global_id.xy();
    let size = params.resolution.as_uvec2();

    if !Camera::contains(size, screen_pos.as_ivec2()) {
        return;
    }

    let model = variant.depth_model(camera);
    let half_res = variant.is_half_res();

    let depth_at = move |pos: UVec2| -> f32 {
        let texel: Vec4 = if half_res {
            downsampled.fetch(pos)
        } else {
            depth.fetch(pos)
        };

        texel.x
    };

    // In half-res mode normals were already reconstructed by the downsampling
    // pass, at full resolution
    let normal_at = move |pos: UVec2, _: Vec3| -> Vec3 {
        if half_res {
            let texel: Vec4 = downsampled.fetch(pos);

            texel.yzw()
        } else {
            reconstruct_normal(
                camera,
                model,
                params.resolution,
                pos.as_ivec2(),
                |pos| depth_at(Camera::clamp(size, pos)),
            )
        }
    };

    let estimator = OcclusionEstimator {
        camera,
        model,
        params,
        samples,
        sample_count: variant.sample_count,
        depth: depth_at,
        normal: normal_at,
    };

    let noise = BlueNoise::new(blue_noise, screen_pos, params.frame).sample();
    let occlusion = estimator.estimate(screen_pos, noise);

    unsafe {
        output.write(screen_pos, occlusion);
    }
}
