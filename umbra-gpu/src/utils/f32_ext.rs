#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

pub trait F32Ext
where
    Self: Sized,
{
    fn sqr(self) -> Self;
    fn saturate(self) -> Self;

    /// Fractional part, `x - floor(x)` (so it's always non-negative).
    fn fract_floor(self) -> Self;

    /// Converts an sRGB-encoded channel into linear space.
    fn srgb_to_linear(self) -> Self;

    /// Converts a linear channel into sRGB encoding.
    fn linear_to_srgb(self) -> Self;
}

impl F32Ext for f32 {
    fn sqr(self) -> Self {
        self * self
    }

    fn saturate(self) -> Self {
        self.clamp(0.0, 1.0)
    }

    fn fract_floor(self) -> Self {
        self - self.floor()
    }

    fn srgb_to_linear(self) -> Self {
        if self <= 0.04045 {
            self / 12.92
        } else {
            ((self + 0.055) / 1.055).powf(2.4)
        }
    }

    fn linear_to_srgb(self) -> Self {
        if self <= 0.0031308 {
            self * 12.92
        } else {
            1.055 * self.powf(1.0 / 2.4) - 0.055
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn fract_floor() {
        assert_relative_eq!(1.25f32.fract_floor(), 0.25);
        assert_relative_eq!((-0.25f32).fract_floor(), 0.75);
    }

    #[test]
    fn srgb() {
        for value in [0.0f32, 0.002, 0.2, 0.5, 1.0] {
            assert_relative_eq!(
                value.linear_to_srgb().srgb_to_linear(),
                value,
                epsilon = 0.0001
            );
        }

        assert_relative_eq!(0.5f32.srgb_to_linear(), 0.214, epsilon = 0.001);
    }
}
