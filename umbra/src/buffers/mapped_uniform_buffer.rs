use std::ops::Deref;
use std::{any, mem};

use bytemuck::Pod;

use super::Bindable;

/// Uniform buffer mirrored on the CPU side.
///
/// [`Self::set()`] compares the new value byte-for-byte with the mirror, so
/// re-setting e.g. the camera of a still frame doesn't cause an upload.
#[derive(Debug)]
pub struct MappedUniformBuffer<T> {
    buffer: wgpu::Buffer,
    data: T,
    dirty: bool,
}

impl<T> MappedUniformBuffer<T>
where
    T: Pod,
{
    pub fn new(device: &wgpu::Device, label: impl AsRef<str>, data: T) -> Self {
        let label = label.as_ref();
        let size = wgpu::util::align_to(
            mem::size_of::<T>() as wgpu::BufferAddress,
            wgpu::COPY_BUFFER_ALIGNMENT.max(16),
        );

        log::debug!(
            "Allocating uniform buffer `{label}`; ty={}, size={size}",
            any::type_name::<T>(),
        );

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::UNIFORM,
            size,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            data,
            dirty: true,
        }
    }

    /// Replaces the contents; returns whether they actually changed.
    pub fn set(&mut self, data: T) -> bool {
        let changed = is_changed(&self.data, &data);

        if changed {
            self.data = data;
            self.dirty = true;
        }

        changed
    }

    /// Uploads the contents, if they changed since the last upload.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if !mem::take(&mut self.dirty) {
            return;
        }

        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&self.data));
    }
}

impl<T> Deref for MappedUniformBuffer<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> Bindable for MappedUniformBuffer<T> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT
                | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        vec![(layout, self.buffer.as_entire_binding())]
    }
}

fn is_changed<T>(curr: &T, new: &T) -> bool
where
    T: Pod,
{
    bytemuck::bytes_of(curr) != bytemuck::bytes_of(new)
}
