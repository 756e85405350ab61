use core::f32::consts::PI;

use glam::{vec2, vec3, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::GOLDEN_ANGLE;

/// Number of rings the Poisson-disk spiral winds around.
pub const POISSON_RINGS: f32 = 11.0;

/// Returns `k`-th of `n` directions covering the unit hemisphere around +Z.
///
/// Points are laid on a golden-angle spiral over the unit disk and then lifted
/// onto the hemisphere, which yields a cosine-weighted, stratified set.
pub fn hemisphere_sample(k: u32, n: u32) -> Vec3 {
    let angle = (k as f32) * GOLDEN_ANGLE;
    let radius = ((k as f32) + 0.5).sqrt() / (n as f32).sqrt();
    let x = radius * angle.cos();
    let y = radius * angle.sin();
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();

    vec3(x, y, z)
}

/// Returns `k`-th of `n` offsets of the Poisson-disk spiral used for blurring.
pub fn poisson_disk_sample(k: u32, n: u32) -> Vec2 {
    let n = n as f32;
    let angle = (k as f32) * 2.0 * PI * POISSON_RINGS / n;
    let radius = ((k as f32) + 1.0) / n;

    vec2(angle.cos(), angle.sin()) * radius.powf(0.75)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn hemisphere() {
        for n in 1..=64 {
            for k in 0..n {
                let sample = hemisphere_sample(k, n);

                assert_relative_eq!(sample.length(), 1.0, epsilon = 0.0001);
                assert!(sample.z >= 0.0, "n={n}, k={k}, sample={sample:?}");
                assert_eq!(sample, hemisphere_sample(k, n));
            }
        }
    }

    #[test]
    fn poisson_disk() {
        for n in 1..=64 {
            for k in 0..n {
                let sample = poisson_disk_sample(k, n);

                assert!(sample.length() <= 1.0 + 1e-6, "n={n}, k={k}");
            }

            assert_relative_eq!(
                poisson_disk_sample(n - 1, n).length(),
                1.0,
                epsilon = 0.0001
            );
        }
    }
}
