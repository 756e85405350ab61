use std::any;
use std::marker::PhantomData;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use super::Bindable;

/// Storage buffer whose contents are provided at creation and never change
/// afterwards; new contents mean a new buffer.
#[derive(Debug)]
pub struct StorageBuffer<T> {
    buffer: wgpu::Buffer,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> StorageBuffer<T>
where
    T: Pod,
{
    pub fn new(device: &wgpu::Device, label: impl AsRef<str>, data: &[T]) -> Self {
        let label = label.as_ref();

        log::debug!(
            "Allocating storage buffer `{label}`; ty={}, len={}",
            any::type_name::<T>(),
            data.len(),
        );

        // Empty bindings are not allowed, so an empty set still occupies one
        // (zeroed) item
        let contents = if data.is_empty() {
            vec![0; std::mem::size_of::<T>()]
        } else {
            bytemuck::cast_slice(data).to_vec()
        };

        let buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: &contents,
                usage: wgpu::BufferUsages::STORAGE,
            });

        Self {
            buffer,
            len: data.len(),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl<T> Bindable for StorageBuffer<T> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage {
                    // rust-gpu doesn't decorate read-only buffers with
                    // `NonWritable`, so naga rejects read-only bindings
                    read_only: false,
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let resource = self.buffer.as_entire_binding();

        vec![(layout, resource)]
    }
}
