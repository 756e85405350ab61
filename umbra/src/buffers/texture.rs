use glam::UVec2;

use super::Bindable;

#[derive(Debug)]
pub struct Texture {
    tex: wgpu::Texture,
    view: wgpu::TextureView,
    sample_view: Option<wgpu::TextureView>,
    format: wgpu::TextureFormat,
}

impl Texture {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: UVec2,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let label = label.as_ref();

        log::debug!(
            "Allocating texture `{label}`; size={size:?}, format={format:?}"
        );

        assert!(size.x > 0);
        assert!(size.y > 0);

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        let view = tex.create_view(&Default::default());

        // Depth-stencil textures can only be sampled through a view that
        // selects a single aspect
        let sample_view = format.has_depth_aspect().then(|| {
            tex.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{label}_depth")),
                aspect: wgpu::TextureAspect::DepthOnly,
                ..Default::default()
            })
        });

        Self {
            tex,
            view,
            sample_view,
            format,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.tex.width(), self.tex.height())
    }

    /// Uploads given texels, laid out row by row.
    pub fn write(&self, queue: &wgpu::Queue, data: &[u8]) {
        let size = self.size();
        let bytes_per_row = data.len() as u32 / size.y;

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size.y),
            },
            wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Allows to read this texture using `fetch()`; there's no sampler, so
    /// the texture is bound as unfilterable.
    pub fn bind_sampled(&self) -> impl Bindable + '_ {
        SampledTexture { parent: self }
    }

    /// Allows to read and write this texture as a storage image.
    pub fn bind_writable(&self) -> impl Bindable + '_ {
        WritableTexture { parent: self }
    }
}

pub struct SampledTexture<'a> {
    parent: &'a Texture,
}

impl Bindable for SampledTexture<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT
                | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float {
                    filterable: false,
                },
            },
            count: None,
        };

        let view = self
            .parent
            .sample_view
            .as_ref()
            .unwrap_or(&self.parent.view);

        vec![(layout, wgpu::BindingResource::TextureView(view))]
    }
}

pub struct WritableTexture<'a> {
    parent: &'a Texture,
}

impl Bindable for WritableTexture<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::ReadWrite,
                format: self.parent.format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        };

        vec![(layout, wgpu::BindingResource::TextureView(&self.parent.view))]
    }
}
