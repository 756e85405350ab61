use glam::{vec4, Mat4, UVec2};

use crate::{gpu, DepthConvention};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// Camera the scene was rendered with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// World-to-view transformation
    pub view: Mat4,

    /// View-to-clip transformation, mapping depth into `0..1`
    pub projection: Mat4,

    pub near: f32,
    pub far: f32,
    pub kind: Projection,

    /// What the scene's depth buffer contains; when it doesn't match the
    /// configured convention, the configuration follows the camera
    pub depth_convention: DepthConvention,
}

impl Camera {
    /// Creates a right-handed perspective camera; `fov_y` is in radians.
    pub fn perspective(
        view: Mat4,
        fov_y: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
        depth_convention: DepthConvention,
    ) -> Self {
        let projection = if depth_convention == DepthConvention::ReverseZ {
            Mat4::perspective_rh(fov_y, aspect_ratio, far, near)
        } else {
            Mat4::perspective_rh(fov_y, aspect_ratio, near, far)
        };

        Self {
            view,
            projection,
            near,
            far,
            kind: Projection::Perspective,
            depth_convention,
        }
    }

    /// Creates a right-handed orthographic camera spanning `height` world
    /// units vertically.
    pub fn orthographic(
        view: Mat4,
        height: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
        depth_convention: DepthConvention,
    ) -> Self {
        let half_h = height / 2.0;
        let half_w = half_h * aspect_ratio;

        let projection = if depth_convention == DepthConvention::ReverseZ {
            Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, far, near)
        } else {
            Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
        };

        Self {
            view,
            projection,
            near,
            far,
            kind: Projection::Orthographic,
            depth_convention,
        }
    }

    pub fn is_orthographic(&self) -> bool {
        self.kind == Projection::Orthographic
    }

    pub(crate) fn serialize(&self, size: UVec2) -> gpu::Camera {
        let size = size.as_vec2();

        gpu::Camera {
            projection: self.projection,
            projection_inv: self.projection.inverse(),
            view: self.view,
            view_inv: self.view.inverse(),
            screen: vec4(size.x, size.y, 1.0 / size.x, 1.0 / size.y),
            clip: vec4(self.near, self.far, 0.0, 0.0),
        }
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{:?}, near={}, far={}, depth={:?}",
            self.kind, self.near, self.far, self.depth_convention
        )
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3, Vec3, Vec4Swizzles};

    use super::*;

    #[test]
    fn serialize() {
        let view = Mat4::look_at_rh(vec3(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y);

        let camera = Camera::perspective(
            view,
            1.0,
            2.0,
            0.5,
            50.0,
            DepthConvention::Linear,
        );

        let actual = camera.serialize(uvec2(800, 400));

        assert_eq!(uvec2(800, 400), actual.screen_size());
        assert_eq!(0.5, actual.near());
        assert_eq!(50.0, actual.far());

        assert!((actual.projection * actual.projection_inv)
            .abs_diff_eq(Mat4::IDENTITY, 1e-5));

        assert!((actual.view * actual.view_inv).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn reverse_z() {
        let camera = Camera::perspective(
            Mat4::IDENTITY,
            1.0,
            1.0,
            0.5,
            50.0,
            DepthConvention::ReverseZ,
        );

        let near = camera.projection * vec3(0.0, 0.0, -0.5).extend(1.0);
        let far = camera.projection * vec3(0.0, 0.0, -50.0).extend(1.0);

        assert!((near.z / near.w - 1.0).abs() < 1e-5);
        assert!((far.z / far.w).abs() < 1e-5);

        let camera = Camera::orthographic(
            Mat4::IDENTITY,
            10.0,
            1.0,
            0.5,
            50.0,
            DepthConvention::ReverseZ,
        );

        assert!(camera.is_orthographic());

        let near = camera.projection * vec3(0.0, 0.0, -0.5).extend(1.0);

        assert!((near.xyz().z - 1.0).abs() < 1e-5);
    }
}
