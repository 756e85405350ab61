use umbra_gpu::prelude::*;

#[spirv(vertex)]
pub fn vs(
    #[spirv(vertex_index)] vert_idx: i32,
    #[spirv(position)] output: &mut Vec4,
) {
    *output = full_screen_triangle(vert_idx);
}

/// Blends the denoised occlusion into the accumulation buffer; the pipeline
/// uses `src_alpha` blending, so alpha carries the frame's weight.
#[spirv(fragment)]
pub fn fs(
    #[spirv(frag_coord)] pos: Vec4,
    #[spirv(push_constant)] params: &AccumulationPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] occlusion: Tex,
    frag_color: &mut Vec4,
) {
    let texel: Vec4 = occlusion.fetch(pos.xy().as_uvec2());

    *frag_color = Vec3::splat(texel.x).extend(params.weight);
}
