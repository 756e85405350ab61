use bytemuck::{Pod, Zeroable};
use glam::{vec2, IVec2, Mat4, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Camera {
    pub projection: Mat4,
    pub projection_inv: Mat4,
    pub view: Mat4,
    pub view_inv: Mat4,

    /// x - viewport width (in pixels)
    /// y - viewport height (in pixels)
    /// z - 1 / viewport width
    /// w - 1 / viewport height
    pub screen: Vec4,

    /// x - near plane
    /// y - far plane
    pub clip: Vec4,
}

impl Camera {
    pub fn near(&self) -> f32 {
        self.clip.x
    }

    pub fn far(&self) -> f32 {
        self.clip.y
    }

    pub fn screen_size(&self) -> UVec2 {
        self.screen.xy().as_uvec2()
    }

    /// Given a point in view-coordinates, returns it in clip-coordinates.
    pub fn view_to_clip(&self, pos: Vec3) -> Vec4 {
        self.projection * pos.extend(1.0)
    }

    /// Given a point in NDC (where `z` is whatever the depth buffer contains,
    /// already normalized into the projection's range), returns it in
    /// view-coordinates.
    pub fn ndc_to_view(&self, ndc: Vec3) -> Vec3 {
        self.projection_inv.project_point3(ndc)
    }

    /// Converts screen-space UV (top-left origin) into NDC's xy.
    pub fn uv_to_ndc(uv: Vec2) -> Vec2 {
        vec2(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0)
    }

    /// Converts NDC's xy into screen-space UV (top-left origin).
    pub fn ndc_to_uv(ndc: Vec2) -> Vec2 {
        vec2(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5)
    }

    /// Returns whether given point lays inside a viewport of given size.
    pub fn contains(size: UVec2, pos: IVec2) -> bool {
        let size = size.as_ivec2();

        pos.x >= 0 && pos.y >= 0 && pos.x < size.x && pos.y < size.y
    }

    /// Clamps given point into a viewport of given size.
    pub fn clamp(size: UVec2, pos: IVec2) -> UVec2 {
        pos.clamp(IVec2::ZERO, size.as_ivec2() - IVec2::ONE).as_uvec2()
    }
}

#[cfg(test)]
mod tests {
    use glam::{ivec2, uvec2, vec3};

    use super::*;

    #[test]
    fn uv_and_ndc() {
        let uv = vec2(0.25, 0.75);
        let ndc = Camera::uv_to_ndc(uv);

        assert_eq!(ndc, vec2(-0.5, -0.5));
        assert_eq!(Camera::ndc_to_uv(ndc), uv);
    }

    #[test]
    fn contains_and_clamp() {
        let size = uvec2(4, 3);

        assert!(Camera::contains(size, ivec2(0, 0)));
        assert!(Camera::contains(size, ivec2(3, 2)));
        assert!(!Camera::contains(size, ivec2(4, 0)));
        assert!(!Camera::contains(size, ivec2(0, -1)));

        assert_eq!(Camera::clamp(size, ivec2(-3, 7)), uvec2(0, 2));
    }

    #[test]
    fn view_roundtrip() {
        let projection =
            Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);

        let camera = Camera {
            projection,
            projection_inv: projection.inverse(),
            ..Default::default()
        };

        let pos = vec3(1.0, -2.0, -10.0);
        let clip = camera.view_to_clip(pos);
        let ndc = clip.xyz() / clip.w;

        assert!(camera.ndc_to_view(ndc).abs_diff_eq(pos, 0.001));
    }
}
