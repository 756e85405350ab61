use glam::Vec4;

use crate::{gpu, Configuration, StorageBuffer};

/// Sample kernels uploaded for the estimator and the denoiser.
#[derive(Debug)]
pub struct SampleSets {
    pub hemisphere: StorageBuffer<Vec4>,
    pub poisson: StorageBuffer<Vec4>,
}

impl SampleSets {
    pub fn new(device: &wgpu::Device, config: &Configuration) -> Self {
        Self {
            hemisphere: Self::hemisphere_buffer(device, config.ao_samples),
            poisson: Self::poisson_buffer(device, config.denoise_samples),
        }
    }

    pub fn rebuild_hemisphere(&mut self, device: &wgpu::Device, n: u32) {
        self.hemisphere = Self::hemisphere_buffer(device, n);
    }

    pub fn rebuild_poisson(&mut self, device: &wgpu::Device, n: u32) {
        self.poisson = Self::poisson_buffer(device, n);
    }

    fn hemisphere_buffer(device: &wgpu::Device, n: u32) -> StorageBuffer<Vec4> {
        StorageBuffer::new(device, "umbra_hemisphere_samples", &hemisphere(n))
    }

    fn poisson_buffer(device: &wgpu::Device, n: u32) -> StorageBuffer<Vec4> {
        StorageBuffer::new(device, "umbra_poisson_samples", &poisson_disk(n))
    }
}

/// Returns `n` directions over the unit hemisphere, padded to `Vec4`.
pub fn hemisphere(n: u32) -> Vec<Vec4> {
    (0..n)
        .map(|k| gpu::hemisphere_sample(k, n).extend(0.0))
        .collect()
}

/// Returns `n` offsets within the unit disk, padded to `Vec4`.
pub fn poisson_disk(n: u32) -> Vec<Vec4> {
    (0..n)
        .map(|k| gpu::poisson_disk_sample(k, n).extend(0.0).extend(0.0))
        .collect()
}
