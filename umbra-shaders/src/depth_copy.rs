use umbra_gpu::prelude::*;

#[spirv(vertex)]
pub fn vs(
    #[spirv(vertex_index)] vert_idx: i32,
    #[spirv(position)] output: &mut Vec4,
) {
    *output = full_screen_triangle(vert_idx);
}

/// Seeds a transparency target: clears its color and copies the scene's
/// depth, pushed slightly away so that the scene doesn't occlude itself once
/// re-rendered.
#[spirv(fragment(depth_replacing))]
pub fn fs(
    #[spirv(frag_coord)] pos: Vec4,
    #[spirv(push_constant)] params: &DepthCopyPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1)] depth: Tex,
    #[spirv(frag_depth)] out_depth: &mut f32,
    frag_color: &mut Vec4,
) {
    let model = DepthModel::new(camera, params.depth_convention, false);
    let texel: Vec4 = depth.fetch(pos.xy().as_uvec2());

    *out_depth = model.push_back(texel.x);
    *frag_color = Vec4::ZERO;
}
