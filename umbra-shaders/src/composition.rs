use umbra_gpu::prelude::*;

#[spirv(vertex)]
pub fn vs(
    #[spirv(vertex_index)] vert_idx: i32,
    #[spirv(position)] output: &mut Vec4,
) {
    *output = full_screen_triangle(vert_idx);
}

#[spirv(fragment)]
#[allow(clippy::too_many_arguments)]
pub fn fs(
    #[spirv(frag_coord)] pos: Vec4,
    #[spirv(push_constant)] params: &CompositionPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1, uniform)] variant: &Variant,
    #[spirv(descriptor_set = 0, binding = 2)] scene_color: Tex,
    #[spirv(descriptor_set = 0, binding = 3)] scene_depth: Tex,
    #[spirv(descriptor_set = 0, binding = 4)] accumulation: Tex,
    #[spirv(descriptor_set = 0, binding = 5)] downsampled: Tex,
    #[spirv(descriptor_set = 0, binding = 6)] no_depth_write_color: Tex,
    #[spirv(descriptor_set = 0, binding = 7)] depth_write_color: Tex,
    #[spirv(descriptor_set = 0, binding = 8)] depth_write_depth: Tex,
    frag_color: &mut Vec4,
) {
    let screen_pos = pos.xy().as_uvec2();
    let model = variant.depth_model(camera);

    let scene: Vec4 = scene_color.fetch(screen_pos);
    let depth: Vec4 = scene_depth.fetch(screen_pos);
    let depth = depth.x;
    let distance = model.buffer_to_linear(depth);

    let ao_size = params.ao_resolution.as_uvec2();

    let occlusion_at = move |pos: UVec2| -> f32 {
        let texel: Vec4 = accumulation.fetch(pos);

        texel.x
    };

    let occlusion = if variant.is_half_res() {
        if variant.is_depth_aware_upsampling() {
            upsample(screen_pos, distance, ao_size, occlusion_at, |pos| {
                let texel: Vec4 = downsampled.fetch(pos);

                model.buffer_to_linear(texel.x)
            })
        } else {
            occlusion_at(half_res_pos(screen_pos, ao_size))
        }
    } else {
        occlusion_at(screen_pos)
    };

    let transparency =
        if params.has(CompositionPassParams::FLAG_TRANSPARENCY) {
            let no_depth_write: Vec4 = no_depth_write_color.fetch(screen_pos);
            let depth_write: Vec4 = depth_write_color.fetch(screen_pos);
            let depth_write_depth: Vec4 = depth_write_depth.fetch(screen_pos);

            Transparency {
                no_depth_write_alpha: no_depth_write.w,
                depth_write_alpha: depth_write.w,
                depth_write_on_top: depth_write_depth.x == depth,
            }
        } else {
            Transparency::default()
        };

    let ao = if model.is_sky(depth) {
        1.0
    } else {
        shade_occlusion(params, occlusion, distance, transparency)
    };

    let color = compose(
        params,
        scene.xyz(),
        ao,
        screen_pos.x,
        camera.screen_size().x,
    );

    *frag_color = color.extend(1.0);
}
