use glam::{ivec2, IVec2, Vec2, Vec3};

use crate::{view_pos, Camera, DepthModel};

/// Reconstructs view-space normal of the surface visible at given pixel,
/// looking only at the depth buffer.
///
/// For each axis we look at two pixels on both sides and differentiate towards
/// the side that continues the surface more smoothly, so that silhouette edges
/// don't produce bogus normals.
///
/// `depth` must clamp coordinates to the viewport.
pub fn reconstruct_normal(
    camera: &Camera,
    model: DepthModel,
    size: Vec2,
    pos: IVec2,
    depth: impl Fn(IVec2) -> f32,
) -> Vec3 {
    let texel = 1.0 / size;
    let uv = (pos.as_vec2() + 0.5) * texel;

    let c0 = depth(pos);
    let l1 = depth(pos - ivec2(1, 0));
    let l2 = depth(pos - ivec2(2, 0));
    let r1 = depth(pos + ivec2(1, 0));
    let r2 = depth(pos + ivec2(2, 0));
    let u1 = depth(pos - ivec2(0, 1));
    let u2 = depth(pos - ivec2(0, 2));
    let d1 = depth(pos + ivec2(0, 1));
    let d2 = depth(pos + ivec2(0, 2));

    let dl = ((2.0 * l1 - l2) - c0).abs();
    let dr = ((2.0 * r1 - r2) - c0).abs();
    let du = ((2.0 * u1 - u2) - c0).abs();
    let dd = ((2.0 * d1 - d2) - c0).abs();

    let center = view_pos(camera, model, uv, c0);

    // Both tangents point towards screen's right & top, so that their cross
    // product faces the camera
    let dpdx = if dl < dr {
        center - view_pos(camera, model, uv - Vec2::X * texel.x, l1)
    } else {
        view_pos(camera, model, uv + Vec2::X * texel.x, r1) - center
    };

    let dpdy = if du < dd {
        view_pos(camera, model, uv - Vec2::Y * texel.y, u1) - center
    } else {
        center - view_pos(camera, model, uv + Vec2::Y * texel.y, d1)
    };

    dpdx.cross(dpdy).normalize()
}

#[cfg(test)]
mod tests {
    use glam::{vec2, vec3, Mat4, Vec4};

    use super::*;

    fn camera() -> Camera {
        let projection = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);

        Camera {
            projection,
            projection_inv: projection.inverse(),
            clip: Vec4::new(0.1, 100.0, 0.0, 0.0),
            ..Default::default()
        }
    }

    fn model() -> DepthModel {
        DepthModel {
            near: 0.1,
            far: 100.0,
            convention: DepthModel::LINEAR,
            ortho: false,
        }
    }

    /// Depth of a plane at `z = -distance`, as seen at given pixel.
    fn plane_depth(camera: &Camera, distance: f32) -> f32 {
        let clip = camera.view_to_clip(vec3(0.0, 0.0, -distance));

        clip.z / clip.w
    }

    #[test]
    fn facing_camera() {
        let camera = camera();
        let depth = plane_depth(&camera, 10.0);

        let normal = reconstruct_normal(
            &camera,
            model(),
            vec2(32.0, 32.0),
            ivec2(16, 16),
            |_| depth,
        );

        assert!(normal.abs_diff_eq(Vec3::Z, 0.001), "{normal:?}");
    }

    #[test]
    fn tilted_plane() {
        // Plane `y = -2`, i.e. a floor below the camera
        let camera = camera();
        let size = vec2(64.0, 64.0);

        let depth = |pos: IVec2| {
            let uv = (pos.as_vec2() + 0.5) / size;
            let ndc = Camera::uv_to_ndc(uv);
            let far = camera.ndc_to_view(ndc.extend(1.0));
            let t = -2.0 / far.y;
            let clip = camera.view_to_clip(far * t);

            clip.z / clip.w
        };

        let normal =
            reconstruct_normal(&camera, model(), size, ivec2(32, 56), depth);

        assert!(normal.abs_diff_eq(Vec3::Y, 0.01), "{normal:?}");
    }

    #[test]
    fn silhouette() {
        // Left half is a near wall, right half is a far wall; the pixel right
        // at the boundary should still see its own (near) wall
        let camera = camera();
        let near = plane_depth(&camera, 5.0);
        let far = plane_depth(&camera, 50.0);

        let normal = reconstruct_normal(
            &camera,
            model(),
            vec2(32.0, 32.0),
            ivec2(15, 16),
            |pos| if pos.x <= 15 { near } else { far },
        );

        assert!(normal.abs_diff_eq(Vec3::Z, 0.001), "{normal:?}");
    }
}
