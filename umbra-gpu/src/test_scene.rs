//! Ray-casted depth buffer of a cube standing on an infinite floor.

use glam::{uvec2, vec3, vec4, Mat4, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::{Camera, DepthModel};

pub struct TestScene {
    pub camera: Camera,
    pub model: DepthModel,
    pub size: UVec2,
    view: Mat4,
    depths: Vec<f32>,
}

impl TestScene {
    const EYE: Vec3 = vec3(0.0, 15.0, 25.0);
    const NEAR: f32 = 0.1;
    const FAR: f32 = 100.0;
    const CUBE_MIN: Vec3 = vec3(-2.0, 0.0, -2.0);
    const CUBE_MAX: Vec3 = vec3(2.0, 4.0, 2.0);

    pub fn new() -> Self {
        let size = uvec2(128, 128);
        let view = Mat4::look_at_rh(Self::EYE, Vec3::ZERO, Vec3::Y);

        let projection = Mat4::perspective_rh(
            60f32.to_radians(),
            1.0,
            Self::NEAR,
            Self::FAR,
        );

        let camera = Camera {
            projection,
            projection_inv: projection.inverse(),
            view,
            view_inv: view.inverse(),
            screen: vec4(
                size.x as f32,
                size.y as f32,
                1.0 / size.x as f32,
                1.0 / size.y as f32,
            ),
            clip: vec4(Self::NEAR, Self::FAR, 0.0, 0.0),
        };

        let model = DepthModel::new(&camera, DepthModel::LINEAR, false);
        let mut depths = Vec::new();

        for y in 0..size.y {
            for x in 0..size.x {
                let uv = (uvec2(x, y).as_vec2() + 0.5) / size.as_vec2();
                let ndc = Camera::uv_to_ndc(uv);
                let target = camera.ndc_to_view(ndc.extend(1.0));
                let dir = camera.view_inv.transform_vector3(target).normalize();

                let depth = Self::trace(dir)
                    .map(|t| {
                        let hit = view.transform_point3(Self::EYE + dir * t);
                        let clip = projection * hit.extend(1.0);

                        clip.z / clip.w
                    })
                    .filter(|depth| *depth < 1.0)
                    .unwrap_or(1.0);

                depths.push(depth);
            }
        }

        Self {
            camera,
            model,
            size,
            view,
            depths,
        }
    }

    pub fn depth(&self, pos: UVec2) -> f32 {
        self.depths[(pos.y * self.size.x + pos.x) as usize]
    }

    /// Returns a pseudo-random, reproducible noise texel for given pixel.
    pub fn noise(&self, pos: UVec2) -> Vec4 {
        let seed = (pos.y * self.size.x + pos.x) * 4;

        vec4(hash(seed), hash(seed + 1), hash(seed + 2), hash(seed + 3))
    }

    /// Returns the pixel at which given world-space point is visible.
    pub fn project(&self, world: Vec3) -> Vec2 {
        let clip = self.camera.projection
            * self.view.transform_point3(world).extend(1.0);

        Camera::ndc_to_uv(clip.xy() / clip.w) * self.size.as_vec2()
    }

    /// Point on the floor right in front of the cube.
    pub fn contact_point(&self) -> Vec3 {
        vec3(0.0, 0.0, Self::CUBE_MAX.z + 0.3)
    }

    /// Point on the floor farther than twice the occlusion radius from the
    /// cube.
    pub fn open_point(&self) -> Vec3 {
        vec3(11.0, 0.0, 8.0)
    }

    fn trace(dir: Vec3) -> Option<f32> {
        let floor = if dir.y < 0.0 {
            Some(-Self::EYE.y / dir.y)
        } else {
            None
        };

        let cube = {
            let t0 = (Self::CUBE_MIN - Self::EYE) / dir;
            let t1 = (Self::CUBE_MAX - Self::EYE) / dir;
            let near = t0.min(t1).max_element();
            let far = t0.max(t1).min_element();

            if near <= far && near > 0.0 {
                Some(near)
            } else {
                None
            }
        };

        match (floor, cube) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

fn hash(mut x: u32) -> f32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846ca68b);
    x ^= x >> 16;

    (x >> 8) as f32 / (1 << 24) as f32
}
