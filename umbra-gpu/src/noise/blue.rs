use glam::{uvec2, vec2, UVec2, Vec2, Vec4, Vec4Swizzles};

use crate::{F32Ext, Tex};

/// Tiled blue-noise texture, shifted each accumulated frame by an irrational
/// increment so that consecutive frames see decorrelated noise.
pub struct BlueNoise<'a> {
    tex: Tex<'a>,
    pos: UVec2,
    frame: u32,
}

impl<'a> BlueNoise<'a> {
    pub const SIZE: UVec2 = uvec2(128, 128);

    /// Per-frame offset of the first two channels; derived from the golden
    /// ratio and its two-dimensional generalization (plastic number).
    pub const FRAME_OFFSET: Vec2 = vec2(1.618034, 1.3247179);

    /// Frames repeat after this many; keeps `FRAME_OFFSET * frame` small
    /// enough for its fractional part to stay precise.
    pub const FRAME_PERIOD: u32 = 1024;

    pub fn new(tex: Tex<'a>, pos: UVec2, frame: u32) -> Self {
        Self {
            tex,
            pos: pos % Self::SIZE,
            frame,
        }
    }

    pub fn sample(self) -> Vec4 {
        let texel: Vec4 = self.tex.fetch(self.pos);

        Self::jitter(texel, self.frame)
    }

    /// Offsets `rg` of given noise texel for given frame.
    pub fn jitter(texel: Vec4, frame: u32) -> Vec4 {
        let frame = (frame % Self::FRAME_PERIOD) as f32;
        let rg = texel.xy() + Self::FRAME_OFFSET * frame;

        Vec4::new(
            rg.x.fract_floor(),
            rg.y.fract_floor(),
            texel.z,
            texel.w,
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec4;

    use super::*;

    #[test]
    fn jitter() {
        let texel = vec4(0.25, 0.5, 0.1, 0.2);

        assert_eq!(BlueNoise::jitter(texel, 0), texel);

        let jittered = BlueNoise::jitter(texel, 1);

        assert_relative_eq!(jittered.x, 0.868034, epsilon = 0.0001);
        assert_relative_eq!(jittered.y, 0.8247179, epsilon = 0.0001);
        assert_eq!(jittered.zw(), texel.zw());

        for frame in 0..64 {
            let jittered = BlueNoise::jitter(texel, frame);

            assert!(jittered.x >= 0.0 && jittered.x < 1.0);
            assert!(jittered.y >= 0.0 && jittered.y < 1.0);
        }
    }

    #[test]
    fn jitter_keeps_precision_for_large_frames() {
        for frame in [1_000_000, 10_000_000, u32::MAX] {
            let mut xs: Vec<u32> = (0..256)
                .map(|i| {
                    let texel = vec4(i as f32 / 256.0, 0.0, 0.0, 0.0);

                    (BlueNoise::jitter(texel, frame).x * 4096.0) as u32
                })
                .collect();

            xs.sort_unstable();
            xs.dedup();

            assert_eq!(256, xs.len(), "frame={frame}");
        }

        let texel = vec4(0.25, 0.5, 0.1, 0.2);

        assert_eq!(
            BlueNoise::jitter(texel, 3),
            BlueNoise::jitter(texel, 3 + BlueNoise::FRAME_PERIOD),
        );
    }
}
