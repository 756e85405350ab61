use std::hash::Hash;
use std::sync::Arc;

use fxhash::FxHashMap;
use log::debug;

use crate::{
    gpu, Configuration, DepthConvention, MappedUniformBuffer, PassPipeline,
};

/// Pipeline variants built so far, keyed by everything that affects their
/// compilation.
///
/// Variants are never evicted; there's only a handful of combinations and
/// switching back to a previously used one shouldn't cause a hitch.
#[derive(Debug)]
pub struct VariantCache<K, V> {
    variants: FxHashMap<K, Arc<V>>,
    builds: usize,
}

impl<K, V> Default for VariantCache<K, V> {
    fn default() -> Self {
        Self {
            variants: Default::default(),
            builds: 0,
        }
    }
}

impl<K, V> VariantCache<K, V>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
{
    pub fn get_or_insert_with(
        &mut self,
        key: K,
        build: impl FnOnce(K) -> V,
    ) -> Arc<V> {
        let builds = &mut self.builds;

        let variant = self.variants.entry(key).or_insert_with(|| {
            debug!("Building variant: {key:?}");

            *builds += 1;

            Arc::new(build(key))
        });

        Arc::clone(variant)
    }

    /// Returns how many variants have been built.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DownsampleKey {
    pub depth_convention: DepthConvention,
    pub ortho: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OcclusionKey {
    pub samples: u32,
    pub half_res: bool,
    pub depth_convention: DepthConvention,
    pub ortho: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DenoiseKey {
    pub samples: u32,
    pub depth_convention: DepthConvention,
    pub ortho: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    pub depth_aware_upsampling: bool,
    pub half_res: bool,
    pub depth_convention: DepthConvention,
    pub ortho: bool,
}

impl DownsampleKey {
    pub fn new(config: &Configuration, ortho: bool) -> Self {
        Self {
            depth_convention: config.depth_convention,
            ortho,
        }
    }

    fn serialize(self) -> gpu::Variant {
        gpu::Variant {
            depth_convention: self.depth_convention.serialize(),
            ortho: self.ortho as u32,
            sample_count: 0,
            flags: gpu::Variant::FLAG_HALF_RES,
        }
    }
}

impl OcclusionKey {
    pub fn new(config: &Configuration, ortho: bool) -> Self {
        Self {
            samples: config.ao_samples,
            half_res: config.half_res,
            depth_convention: config.depth_convention,
            ortho,
        }
    }

    fn serialize(self) -> gpu::Variant {
        gpu::Variant {
            depth_convention: self.depth_convention.serialize(),
            ortho: self.ortho as u32,
            sample_count: self.samples,
            flags: flags(self.half_res, false),
        }
    }
}

impl DenoiseKey {
    pub fn new(config: &Configuration, ortho: bool) -> Self {
        Self {
            samples: config.denoise_samples,
            depth_convention: config.depth_convention,
            ortho,
        }
    }

    fn serialize(self, half_res: bool) -> gpu::Variant {
        gpu::Variant {
            depth_convention: self.depth_convention.serialize(),
            ortho: self.ortho as u32,
            sample_count: self.samples,
            flags: flags(half_res, false),
        }
    }
}

impl CompositeKey {
    pub fn new(config: &Configuration, ortho: bool) -> Self {
        Self {
            depth_aware_upsampling: config.depth_aware_upsampling,
            half_res: config.half_res,
            depth_convention: config.depth_convention,
            ortho,
        }
    }

    fn serialize(self) -> gpu::Variant {
        gpu::Variant {
            depth_convention: self.depth_convention.serialize(),
            ortho: self.ortho as u32,
            sample_count: 0,
            flags: flags(self.half_res, self.depth_aware_upsampling),
        }
    }
}

fn flags(half_res: bool, depth_aware_upsampling: bool) -> u32 {
    let mut flags = 0;

    if half_res {
        flags |= gpu::Variant::FLAG_HALF_RES;
    }

    if depth_aware_upsampling {
        flags |= gpu::Variant::FLAG_DEPTH_AWARE_UPSAMPLING;
    }

    flags
}

/// Built variant of a compute pass: its uniform plus its (lazily created)
/// pipeline.
#[derive(Debug)]
pub struct ComputeVariant {
    pub variant: MappedUniformBuffer<gpu::Variant>,
    pub pipeline: Arc<PassPipeline<wgpu::ComputePipeline>>,
}

/// Built variant of a render pass.
#[derive(Debug)]
pub struct RenderVariant {
    pub variant: MappedUniformBuffer<gpu::Variant>,
    pub pipeline: Arc<PassPipeline<wgpu::RenderPipeline>>,
}

impl ComputeVariant {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        variant: gpu::Variant,
    ) -> Self {
        Self {
            variant: uniform(device, queue, label, variant),
            pipeline: Default::default(),
        }
    }
}

/// Variants are shared and thus immutable, so their uniforms get uploaded
/// right away.
fn uniform(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    variant: gpu::Variant,
) -> MappedUniformBuffer<gpu::Variant> {
    let mut buffer = MappedUniformBuffer::new(device, label, variant);

    buffer.flush(queue);
    buffer
}

/// All of the variant caches, one per pass.
#[derive(Debug, Default)]
pub struct Variants {
    pub downsampling: VariantCache<DownsampleKey, ComputeVariant>,
    pub occlusion: VariantCache<OcclusionKey, ComputeVariant>,
    pub denoising: VariantCache<(DenoiseKey, bool), ComputeVariant>,
    pub composition: VariantCache<CompositeKey, RenderVariant>,

    /// Accumulation doesn't depend on any of the settings, so it has just
    /// one variant
    pub accumulation: Arc<PassPipeline<wgpu::RenderPipeline>>,

    /// Same for the transparency passes' depth copy
    pub depth_copy: Arc<PassPipeline<wgpu::RenderPipeline>>,
}

impl Variants {
    pub fn downsampling(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: DownsampleKey,
    ) -> Arc<ComputeVariant> {
        self.downsampling.get_or_insert_with(key, |key| {
            ComputeVariant::new(
                device,
                queue,
                "umbra_downsampling_variant",
                key.serialize(),
            )
        })
    }

    pub fn occlusion(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: OcclusionKey,
    ) -> Arc<ComputeVariant> {
        self.occlusion.get_or_insert_with(key, |key| {
            ComputeVariant::new(
                device,
                queue,
                "umbra_occlusion_variant",
                key.serialize(),
            )
        })
    }

    /// Denoising reads normals from the downsampled target in half-res mode,
    /// so that's part of its key even though it doesn't affect the blur.
    pub fn denoising(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: DenoiseKey,
        half_res: bool,
    ) -> Arc<ComputeVariant> {
        self.denoising
            .get_or_insert_with((key, half_res), |(key, half_res)| {
                ComputeVariant::new(
                    device,
                    queue,
                    "umbra_denoising_variant",
                    key.serialize(half_res),
                )
            })
    }

    pub fn composition(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: CompositeKey,
    ) -> Arc<RenderVariant> {
        self.composition.get_or_insert_with(key, |key| RenderVariant {
            variant: uniform(
                device,
                queue,
                "umbra_composition_variant",
                key.serialize(),
            ),
            pipeline: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_once_per_key() {
        let mut cache = VariantCache::<OcclusionKey, u32>::default();
        let config = Configuration::default();

        let a = OcclusionKey::new(&config, false);
        let b = OcclusionKey::new(
            &Configuration {
                ao_samples: 64,
                ..config.clone()
            },
            false,
        );

        assert_eq!(1, *cache.get_or_insert_with(a, |_| 1));
        assert_eq!(2, *cache.get_or_insert_with(b, |_| 2));
        assert_eq!(1, *cache.get_or_insert_with(a, |_| 3));
        assert_eq!(2, *cache.get_or_insert_with(b, |_| 4));

        assert_eq!(2, cache.builds());
        assert_eq!(2, cache.len());
    }

    #[test]
    fn unrelated_fields_share_variant() {
        let config = Configuration::default();

        let other = Configuration {
            intensity: 1.0,
            ao_radius: 10.0,
            render_mode: crate::RenderMode::AoOnly,
            ..config.clone()
        };

        assert_eq!(
            OcclusionKey::new(&config, false),
            OcclusionKey::new(&other, false)
        );

        assert_eq!(
            CompositeKey::new(&config, false),
            CompositeKey::new(&other, false)
        );

        assert_ne!(
            OcclusionKey::new(&config, false),
            OcclusionKey::new(&config, true)
        );
    }

    #[test]
    fn serialized_flags() {
        let config = Configuration {
            half_res: true,
            depth_convention: DepthConvention::ReverseZ,
            ..Default::default()
        };

        let variant = CompositeKey::new(&config, true).serialize();

        assert!(variant.is_half_res());
        assert!(variant.is_depth_aware_upsampling());
        assert_eq!(gpu::DepthModel::REVERSE_Z, variant.depth_convention);
        assert_eq!(1, variant.ortho);

        let variant = OcclusionKey::new(&config, false).serialize();

        assert!(variant.is_half_res());
        assert!(!variant.is_depth_aware_upsampling());
        assert_eq!(16, variant.sample_count);
    }
}
