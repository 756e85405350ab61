use glam::{uvec2, UVec2};
use log::debug;

use crate::{Configuration, DoubleBuffered, Texture};

/// Textures owned by the pass; each group gets reallocated only when
/// something it depends on changes.
#[derive(Debug)]
pub struct Targets {
    pub size: UVec2,

    /// What the scene gets rendered into, before occlusion is applied
    pub beauty: BeautyTarget,

    /// Depth and normals at occlusion's resolution; present in half-res mode
    pub downsampled: Option<Texture>,

    /// Ping-pong pair written by the estimator and the denoiser
    pub occlusion: DoubleBuffered<Texture>,

    /// Occlusion averaged over frames
    pub accumulation: Texture,

    /// Present when the pass is transparency-aware
    pub transparency: Option<TransparencyTargets>,

    /// Bound in place of the targets that are disabled
    pub placeholder: Texture,
}

impl Targets {
    pub const OCCLUSION_FORMAT: wgpu::TextureFormat =
        wgpu::TextureFormat::Rgba16Float;

    pub const DOWNSAMPLED_FORMAT: wgpu::TextureFormat =
        wgpu::TextureFormat::Rgba32Float;

    pub fn new(
        device: &wgpu::Device,
        size: UVec2,
        config: &Configuration,
    ) -> Self {
        let ao_size = ao_size(size, config.half_res);

        Self {
            size,
            beauty: BeautyTarget::new(device, size, config.stencil),
            downsampled: Self::downsampled(device, ao_size, config.half_res),
            occlusion: Self::occlusion(device, ao_size),
            accumulation: Self::accumulation(device, ao_size),
            transparency: config
                .transparency_aware
                .then(|| TransparencyTargets::new(device, size)),
            placeholder: Texture::new(
                device,
                "umbra_placeholder",
                uvec2(1, 1),
                Self::OCCLUSION_FORMAT,
                wgpu::TextureUsages::TEXTURE_BINDING,
            ),
        }
    }

    /// Size of the targets occlusion is estimated into.
    pub fn ao_size(&self) -> UVec2 {
        self.occlusion.get(false).size()
    }

    /// Reallocates everything that depends on the screen's size.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        size: UVec2,
        config: &Configuration,
    ) {
        debug!("Resizing targets to {size:?} (half_res={})", config.half_res);

        let ao_size = ao_size(size, config.half_res);

        self.size = size;
        self.beauty = BeautyTarget::new(device, size, config.stencil);
        self.downsampled = Self::downsampled(device, ao_size, config.half_res);
        self.occlusion = Self::occlusion(device, ao_size);
        self.accumulation = Self::accumulation(device, ao_size);

        if self.transparency.is_some() {
            self.transparency = Some(TransparencyTargets::new(device, size));
        }
    }

    pub fn rebuild_beauty(&mut self, device: &wgpu::Device, stencil: bool) {
        self.beauty = BeautyTarget::new(device, self.size, stencil);
    }

    pub fn rebuild_downsampled(&mut self, device: &wgpu::Device, half_res: bool) {
        let ao_size = ao_size(self.size, half_res);

        self.downsampled = Self::downsampled(device, ao_size, half_res);
    }

    pub fn rebuild_transparency(&mut self, device: &wgpu::Device, enabled: bool) {
        self.transparency =
            enabled.then(|| TransparencyTargets::new(device, self.size));
    }

    fn downsampled(
        device: &wgpu::Device,
        ao_size: UVec2,
        half_res: bool,
    ) -> Option<Texture> {
        half_res.then(|| {
            Texture::new(
                device,
                "umbra_downsampled",
                ao_size,
                Self::DOWNSAMPLED_FORMAT,
                wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::TEXTURE_BINDING,
            )
        })
    }

    fn occlusion(
        device: &wgpu::Device,
        ao_size: UVec2,
    ) -> DoubleBuffered<Texture> {
        DoubleBuffered::<Texture>::new(
            device,
            "umbra_occlusion",
            ao_size,
            Self::OCCLUSION_FORMAT,
            wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING,
        )
    }

    fn accumulation(device: &wgpu::Device, ao_size: UVec2) -> Texture {
        Texture::new(
            device,
            "umbra_accumulation",
            ao_size,
            Self::OCCLUSION_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING,
        )
    }
}

/// Returns the resolution occlusion gets estimated at.
pub fn ao_size(size: UVec2, half_res: bool) -> UVec2 {
    if half_res {
        (size / 2).max(UVec2::ONE)
    } else {
        size.max(UVec2::ONE)
    }
}

#[derive(Debug)]
pub struct BeautyTarget {
    pub color: Texture,
    pub depth: Texture,
}

impl BeautyTarget {
    pub const COLOR_FORMAT: wgpu::TextureFormat =
        wgpu::TextureFormat::Rgba16Float;

    pub fn new(device: &wgpu::Device, size: UVec2, stencil: bool) -> Self {
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING;

        let depth_format = if stencil {
            wgpu::TextureFormat::Depth24PlusStencil8
        } else {
            wgpu::TextureFormat::Depth32Float
        };

        Self {
            color: Texture::new(
                device,
                "umbra_beauty_color",
                size,
                Self::COLOR_FORMAT,
                usage,
            ),
            depth: Texture::new(
                device,
                "umbra_beauty_depth",
                size,
                depth_format,
                usage,
            ),
        }
    }
}

/// Color and depth of transparent objects, rendered separately so that
/// occlusion can be faded out beneath them.
#[derive(Debug)]
pub struct TransparencyTargets {
    /// Objects that don't write depth
    pub no_depth_write: TransparencyTarget,

    /// Objects that write depth
    pub depth_write: TransparencyTarget,
}

impl TransparencyTargets {
    pub fn new(device: &wgpu::Device, size: UVec2) -> Self {
        Self {
            no_depth_write: TransparencyTarget::new(
                device,
                "umbra_transparency_ndw",
                size,
            ),
            depth_write: TransparencyTarget::new(
                device,
                "umbra_transparency_dw",
                size,
            ),
        }
    }
}

#[derive(Debug)]
pub struct TransparencyTarget {
    pub color: Texture,
    pub depth: Texture,
}

impl TransparencyTarget {
    pub const COLOR_FORMAT: wgpu::TextureFormat =
        wgpu::TextureFormat::Rgba16Float;

    pub const DEPTH_FORMAT: wgpu::TextureFormat =
        wgpu::TextureFormat::Depth32Float;

    fn new(device: &wgpu::Device, label: &str, size: UVec2) -> Self {
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING;

        Self {
            color: Texture::new(
                device,
                format!("{label}_color"),
                size,
                Self::COLOR_FORMAT,
                usage,
            ),
            depth: Texture::new(
                device,
                format!("{label}_depth"),
                size,
                Self::DEPTH_FORMAT,
                usage,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ao_sizes() {
        assert_eq!(uvec2(1920, 1080), ao_size(uvec2(1920, 1080), false));
        assert_eq!(uvec2(960, 540), ao_size(uvec2(1920, 1080), true));
        assert_eq!(uvec2(1, 1), ao_size(uvec2(1, 1), true));
        assert_eq!(uvec2(1, 2), ao_size(uvec2(1, 5), true));
        assert_eq!(uvec2(1, 1), ao_size(uvec2(0, 0), false));
    }
}
