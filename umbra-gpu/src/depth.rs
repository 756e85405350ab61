use glam::{Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{Camera, F32Ext};

/// Describes how values stored in the depth buffer relate to the distance
/// from camera.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct DepthModel {
    pub near: f32,
    pub far: f32,
    pub convention: u32,
    pub ortho: bool,
}

impl DepthModel {
    /// Depth buffer contains NDC depth produced by the projection matrix.
    pub const LINEAR: u32 = 0;

    /// Depth buffer contains `log2(1 + distance) / log2(1 + far)`.
    pub const LOGARITHMIC: u32 = 1;

    /// Depth buffer contains NDC depth produced by a reversed projection
    /// matrix (near plane at 1.0, far plane at 0.0).
    pub const REVERSE_Z: u32 = 2;

    pub fn new(camera: &Camera, convention: u32, ortho: bool) -> Self {
        Self {
            near: camera.near(),
            far: camera.far(),
            convention,
            ortho,
        }
    }

    pub fn is_reversed(self) -> bool {
        self.convention == Self::REVERSE_Z
    }

    fn is_logarithmic(self) -> bool {
        self.convention == Self::LOGARITHMIC && !self.ortho
    }

    /// Value stored in the depth buffer for pixels nothing was drawn onto.
    pub fn sky(self) -> f32 {
        if self.is_reversed() {
            0.0
        } else {
            1.0
        }
    }

    pub fn is_sky(self, depth: f32) -> bool {
        depth == self.sky()
    }

    /// Returns whether `a` lies closer to the camera than `b`.
    pub fn is_nearer(self, a: f32, b: f32) -> bool {
        if self.is_reversed() {
            a > b
        } else {
            a < b
        }
    }

    /// Converts value read from the depth buffer into NDC depth, as produced
    /// by camera's projection matrix.
    pub fn buffer_to_ndc(self, depth: f32) -> f32 {
        if self.is_logarithmic() {
            let distance = self.unpack_log(depth);
            let a = self.far / (self.far - self.near);
            let b = self.far * self.near / (self.near - self.far);

            a + b / distance
        } else {
            depth
        }
    }

    /// Converts value read from the depth buffer into a positive distance
    /// along the view direction.
    pub fn buffer_to_linear(self, depth: f32) -> f32 {
        if self.is_logarithmic() {
            self.unpack_log(depth)
        } else {
            self.ndc_to_linear(depth)
        }
    }

    /// Converts NDC depth into a positive distance along the view direction.
    pub fn ndc_to_linear(self, ndc: f32) -> f32 {
        let ndc = if self.is_reversed() { 1.0 - ndc } else { ndc };

        if self.ortho {
            self.near + ndc * (self.far - self.near)
        } else {
            self.far * self.near / (self.far - ndc * (self.far - self.near))
        }
    }

    /// Applies a tiny bias pushing given depth away from the camera, so that
    /// surfaces re-rendered at the same depth don't z-fight with it.
    pub fn push_back(self, depth: f32) -> f32 {
        const EPSILON: f32 = 0.00001;

        if self.is_reversed() {
            (depth - EPSILON).saturate()
        } else {
            (depth + EPSILON).saturate()
        }
    }

    fn unpack_log(self, depth: f32) -> f32 {
        (depth * (self.far + 1.0).log2()).exp2() - 1.0
    }
}

/// Reconstructs view-space position of a point at given screen-space UV and
/// depth-buffer value.
pub fn view_pos(camera: &Camera, model: DepthModel, uv: Vec2, depth: f32) -> Vec3 {
    camera.ndc_to_view(Camera::uv_to_ndc(uv).extend(model.buffer_to_ndc(depth)))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec2, vec3, Mat4, Vec4, Vec4Swizzles};

    use super::*;

    const NEAR: f32 = 0.5;
    const FAR: f32 = 200.0;

    fn camera(projection: Mat4) -> Camera {
        Camera {
            projection,
            projection_inv: projection.inverse(),
            clip: Vec4::new(NEAR, FAR, 0.0, 0.0),
            ..Default::default()
        }
    }

    fn model(convention: u32, ortho: bool) -> DepthModel {
        DepthModel {
            near: NEAR,
            far: FAR,
            convention,
            ortho,
        }
    }

    fn ndc_of(projection: Mat4, distance: f32) -> f32 {
        let clip = projection * vec3(0.0, 0.0, -distance).extend(1.0);

        clip.z / clip.w
    }

    #[test]
    fn linear() {
        let projection = Mat4::perspective_rh(1.0, 1.0, NEAR, FAR);
        let model = model(DepthModel::LINEAR, false);

        for distance in [NEAR, 1.0, 12.5, 80.0, FAR] {
            let ndc = ndc_of(projection, distance);

            assert_relative_eq!(
                model.buffer_to_linear(ndc),
                distance,
                max_relative = 0.001
            );
        }

        assert!(model.is_sky(1.0));
        assert!(model.is_nearer(0.2, 0.3));
    }

    #[test]
    fn reverse_z() {
        let projection = Mat4::perspective_rh(1.0, 1.0, FAR, NEAR);
        let model = model(DepthModel::REVERSE_Z, false);

        for distance in [NEAR, 1.0, 12.5, 80.0, FAR] {
            let ndc = ndc_of(projection, distance);

            assert_relative_eq!(
                model.buffer_to_linear(ndc),
                distance,
                max_relative = 0.001
            );
        }

        assert!(model.is_sky(0.0));
        assert!(model.is_nearer(0.3, 0.2));
        assert!(model.push_back(0.5) < 0.5);
    }

    #[test]
    fn logarithmic() {
        let projection = Mat4::perspective_rh(1.0, 1.0, NEAR, FAR);
        let model = model(DepthModel::LOGARITHMIC, false);

        for distance in [NEAR, 1.0, 12.5, 80.0] {
            let depth = (1.0 + distance).log2() / (1.0 + FAR).log2();

            assert_relative_eq!(
                model.buffer_to_linear(depth),
                distance,
                max_relative = 0.001
            );

            assert_relative_eq!(
                model.buffer_to_ndc(depth),
                ndc_of(projection, distance),
                epsilon = 0.0001
            );
        }
    }

    #[test]
    fn orthographic() {
        let projection =
            Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, NEAR, FAR);

        let model = model(DepthModel::LINEAR, true);

        for distance in [NEAR, 1.0, 12.5, 80.0, FAR] {
            assert_relative_eq!(
                model.buffer_to_linear(ndc_of(projection, distance)),
                distance,
                max_relative = 0.001
            );
        }
    }

    #[test]
    fn reconstruction() {
        let projection = Mat4::perspective_rh(1.0, 1.5, NEAR, FAR);
        let camera = camera(projection);
        let model = model(DepthModel::LINEAR, false);

        let pos = vec3(2.0, 1.0, -15.0);
        let clip = projection * pos.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        let uv = Camera::ndc_to_uv(ndc.xy());

        let actual = view_pos(&camera, model, uv, ndc.z);

        assert!(actual.abs_diff_eq(pos, 0.01), "{actual:?}");
        assert_eq!(Camera::uv_to_ndc(vec2(0.5, 0.5)), vec2(0.0, 0.0));
    }
}
