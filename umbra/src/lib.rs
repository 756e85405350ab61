//! Screen-space ambient occlusion for wgpu-based renderers.
//!
//! Occlusion is estimated from the scene's depth buffer, denoised, optionally
//! accumulated over frames and finally composited onto the scene:
//!
//! ```text
//! beauty -> (downsampling) -> occlusion -> denoising -> accumulation
//!        -> (transparency) -> composition
//! ```
//!
//! Umbra doesn't draw the scene itself; it asks for that through [`Scene`].

mod accumulation;
mod ambient_occlusion;
mod buffers;
mod camera;
mod config;
mod error;
mod noise;
mod pass;
mod reactor;
mod samples;
mod scene;
mod shaders;
mod stages;
mod targets;
mod timing;
mod variants;

use glam::UVec2;
use log::info;
pub use umbra_gpu as gpu;

pub use self::accumulation::*;
pub use self::ambient_occlusion::*;
pub use self::buffers::*;
pub use self::camera::*;
pub use self::config::*;
pub use self::error::*;
pub use self::noise::*;
pub use self::pass::*;
pub use self::reactor::*;
pub use self::samples::*;
pub use self::scene::*;
pub use self::shaders::*;
pub use self::stages::*;
pub use self::targets::*;
pub use self::timing::*;
pub use self::variants::*;

/// Resources shared by all of the ambient occlusion instances created for
/// given device.
#[derive(Debug)]
pub struct Engine {
    shaders: Shaders,
    blue_noise: BlueNoise,
}

impl Engine {
    /// Device features Umbra can't work without.
    ///
    /// Besides those, the device's `max_push_constant_size` must be at least
    /// 64 bytes.
    pub const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::PUSH_CONSTANTS
        .union(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);

    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self, Error> {
        Self::build(device, queue, &BlueNoise::generate())
    }

    /// Creates engine using custom blue noise; `png` must be a 128x128 image.
    pub fn with_blue_noise(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        png: &[u8],
    ) -> Result<Self, Error> {
        Self::build(device, queue, &BlueNoise::decode(png)?)
    }

    fn build(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        blue_noise: &[u8],
    ) -> Result<Self, Error> {
        info!("Initializing");

        let missing = Self::REQUIRED_FEATURES - device.features();

        if !missing.is_empty() {
            return Err(Error::MissingFeatures(missing));
        }

        Ok(Self {
            shaders: Shaders::new(device)?,
            blue_noise: BlueNoise::new(device, queue, blue_noise),
        })
    }

    pub fn create_ambient_occlusion(
        &self,
        device: &wgpu::Device,
        size: UVec2,
        format: wgpu::TextureFormat,
        config: Configuration,
    ) -> AmbientOcclusion {
        AmbientOcclusion::new(device, size, format, config)
    }
}
