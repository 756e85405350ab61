use glam::{ivec2, IVec2};

use crate::DepthModel;

/// Picks the depth representing a 2x2 block of the full-resolution depth
/// buffer at given half-resolution pixel.
///
/// Pixels alternate in a checkerboard pattern between picking the nearest and
/// the farthest sample, which keeps thin occluders alive after downsampling.
/// Returns the depth together with the full-resolution pixel it came from, so
/// that its normal can be reconstructed at the same spot.
pub fn downsample_depth(
    model: DepthModel,
    pos: IVec2,
    depth: impl Fn(IVec2) -> f32,
) -> (f32, IVec2) {
    let base = pos * 2;

    let offsets = [ivec2(0, 0), ivec2(1, 0), ivec2(0, 1), ivec2(1, 1)];
    let pick_nearest = (pos.x + pos.y) % 2 == 0;

    let mut chosen_depth = depth(base);
    let mut chosen_pos = base;
    let mut i = 1;

    while i < 4 {
        let sample_pos = base + offsets[i];
        let sample = depth(sample_pos);

        let is_better = if pick_nearest {
            model.is_nearer(sample, chosen_depth)
        } else {
            model.is_nearer(chosen_depth, sample)
        };

        if is_better {
            chosen_depth = sample;
            chosen_pos = sample_pos;
        }

        i += 1;
    }

    (chosen_depth, chosen_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(convention: u32) -> DepthModel {
        DepthModel {
            near: 0.1,
            far: 100.0,
            convention,
            ortho: false,
        }
    }

    #[test]
    fn checkerboard() {
        // Full-res 4x2 buffer:
        //
        // 0.5 0.2 | 0.9 0.4
        // 0.3 0.7 | 0.1 0.6
        let depths = [[0.5, 0.2, 0.9, 0.4], [0.3, 0.7, 0.1, 0.6]];
        let depth = |pos: IVec2| depths[pos.y as usize][pos.x as usize];

        // --- Case 1: even pixel picks min
        let (d, pos) =
            downsample_depth(model(DepthModel::LINEAR), ivec2(0, 0), depth);

        assert_eq!(d, 0.2);
        assert_eq!(pos, ivec2(1, 0));

        // --- Case 2: odd pixel picks max
        let (d, pos) =
            downsample_depth(model(DepthModel::LINEAR), ivec2(1, 0), depth);

        assert_eq!(d, 0.9);
        assert_eq!(pos, ivec2(2, 0));

        // --- Case 3: reverse-z mirrors the comparison
        let (d, pos) =
            downsample_depth(model(DepthModel::REVERSE_Z), ivec2(0, 0), depth);

        assert_eq!(d, 0.7);
        assert_eq!(pos, ivec2(1, 1));
    }
}
