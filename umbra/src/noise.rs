use blue_noise_sampler::spp2 as bn;
use glam::{uvec2, UVec2};

use crate::{Bindable, Error, Texture};

/// Tileable noise texture driving the estimator's and the denoiser's
/// per-pixel rotations.
#[derive(Debug)]
pub struct BlueNoise {
    texture: Texture,
}

impl BlueNoise {
    pub const SIZE: UVec2 = uvec2(128, 128);
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, texels: &[u8]) -> Self {
        let texture = Texture::new(
            device,
            "umbra_blue_noise",
            Self::SIZE,
            Self::FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );

        texture.write(queue, texels);

        Self { texture }
    }

    /// Generates the built-in tile: the first four dimensions of the
    /// scrambled Sobol sequence, ranked so that the error is distributed as
    /// blue noise over 128x128 pixels.
    pub fn generate() -> Vec<u8> {
        let mut texels =
            Vec::with_capacity((Self::SIZE.x * Self::SIZE.y * 4) as usize);

        for y in 0..Self::SIZE.y {
            for x in 0..Self::SIZE.x {
                for dim in 0..4 {
                    texels.push(sample(x, y, dim));
                }
            }
        }

        texels
    }

    /// Decodes a custom tile from a PNG file.
    pub fn decode(png: &[u8]) -> Result<Vec<u8>, Error> {
        let image =
            image::load_from_memory_with_format(png, image::ImageFormat::Png)?
                .to_rgba8();

        if image.width() != Self::SIZE.x || image.height() != Self::SIZE.y {
            return Err(Error::InvalidBlueNoise {
                width: image.width(),
                height: image.height(),
            });
        }

        Ok(image.into_raw())
    }

    pub fn bind_sampled(&self) -> impl Bindable + '_ {
        self.texture.bind_sampled()
    }
}

/// Returns the first sample of given dimension for given pixel, scaled into
/// `0..=255`.
fn sample(x: u32, y: u32, dim: u32) -> u8 {
    let pixel = ((x & 127) + (y & 127) * 128) as usize;
    let dim = dim as usize;

    let ranked = (bn::RANKING_TILE[dim + pixel * 8] as u32 & 255) as usize;
    let value = bn::SOBOL[dim + ranked * 256] as u32;
    let value = value ^ (bn::SCRAMBLING_TILE[(dim % 8) + pixel * 8] as u32);

    (value & 255) as u8
}
