use glam::{vec3, Vec3};

use crate::F32Ext;

pub trait Vec3Ext
where
    Self: Sized,
{
    /// Converts this sRGB-encoded color-vector into linear space.
    fn srgb_to_linear(self) -> Self;

    /// Converts this linear color-vector into sRGB encoding.
    fn linear_to_srgb(self) -> Self;
}

impl Vec3Ext for Vec3 {
    fn srgb_to_linear(self) -> Self {
        vec3(
            self.x.srgb_to_linear(),
            self.y.srgb_to_linear(),
            self.z.srgb_to_linear(),
        )
    }

    fn linear_to_srgb(self) -> Self {
        vec3(
            self.x.linear_to_srgb(),
            self.y.linear_to_srgb(),
            self.z.linear_to_srgb(),
        )
    }
}
