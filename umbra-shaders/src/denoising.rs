use umbra_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &DenoisePassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1, uniform)] variant: &Variant,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)] samples: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 3)] blue_noise: Tex,
    #[spirv(descriptor_set = 0, binding = 4)] depth: Tex,
    #[spirv(descriptor_set = 0, binding = 5)] downsampled: Tex,
    #[spirv(descriptor_set = 1, binding = 0)] input: Tex,
    #[spirv(descriptor_set = 1, binding = 1)] output: TexRgba16,
) {
    let screen_pos = global_id.xy();
    let size = params.resolution.as_uvec2();

    if !Camera::contains(size, screen_pos.as_ivec2()) {
        return;
    }

    let half_res = variant.is_half_res();

    let denoiser = Denoiser {
        camera,
        model: variant.depth_model(camera),
        params,
        samples,
        sample_count: variant.sample_count,
        depth: move |pos: UVec2| -> f32 {
            let texel: Vec4 = if half_res {
                downsampled.fetch(pos)
            } else {
                depth.fetch(pos)
            };

            texel.x
        },
        occlusion: move |pos: UVec2| -> Vec4 { input.fetch(pos) },
    };

    let noise = BlueNoise::new(blue_noise, screen_pos, params.frame).sample();
    let occlusion = denoiser.denoise(screen_pos, noise);

    unsafe {
        output.write(screen_pos, occlusion);
    }
}
