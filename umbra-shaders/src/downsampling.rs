use umbra_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1, uniform)] variant: &Variant,
    #[spirv(descriptor_set = 0, binding = 2)] depth: Tex,
    #[spirv(descriptor_set = 0, binding = 3)] output: TexRgba32,
) {
    let screen_pos = global_id.xy();
    let size = camera.screen_size();
    let low_size = (size / 2).max(UVec2::ONE);

    if !Camera::contains(low_size, screen_pos.as_ivec2()) {
        return;
    }

    let model = variant.depth_model(camera);

    let depth_at = move |pos: IVec2| -> f32 {
        let texel: Vec4 = depth.fetch(Camera::clamp(size, pos));

        texel.x
    };

    let (chosen_depth, chosen_pos) =
        downsample_depth(model, screen_pos.as_ivec2(), depth_at);

    let normal =
        reconstruct_normal(camera, model, size.as_vec2(), chosen_pos, depth_at);

    unsafe {
        output.write(
            screen_pos,
            vec4(chosen_depth, normal.x, normal.y, normal.z),
        );
    }
}
