use std::marker::PhantomData;
use std::mem;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

use bytemuck::Pod;
use glam::UVec2;
use log::debug;

use crate::{BindGroup, BindGroupBuilder, DoubleBufferedBindable};

/// Pipeline of a single variant, together with the bind group layouts it was
/// created with.
///
/// Both are created lazily, by the first pass that gets built for given
/// variant; passes rebuilt later (e.g. after resizing) create just their bind
/// groups, against the same layouts.
#[derive(Debug)]
pub struct PassPipeline<T> {
    layouts: OnceLock<Vec<wgpu::BindGroupLayout>>,
    pipeline: OnceLock<T>,
}

impl<T> Default for PassPipeline<T> {
    fn default() -> Self {
        Self {
            layouts: OnceLock::new(),
            pipeline: OnceLock::new(),
        }
    }
}

impl<T> PassPipeline<T> {
    pub fn bind_groups(
        &self,
        device: &wgpu::Device,
        builders: Vec<BindGroupBuilder<'_>>,
    ) -> Vec<BindGroup> {
        let layouts = self.layouts.get_or_init(|| {
            builders
                .iter()
                .map(|builder| builder.layout(device))
                .collect()
        });

        assert_eq!(layouts.len(), builders.len());

        builders
            .into_iter()
            .zip(layouts)
            .map(|(builder, layout)| builder.build(device, layout))
            .collect()
    }

    /// Returns the pipeline, creating it if needed; must be called after
    /// [`Self::bind_groups()`].
    pub fn get_or_init(
        &self,
        f: impl FnOnce(&[&wgpu::BindGroupLayout]) -> T,
    ) -> &T {
        self.pipeline.get_or_init(|| {
            let layouts: Vec<_> = self
                .layouts
                .get()
                .map(|layouts| layouts.iter().collect())
                .unwrap_or_default();

            f(&layouts)
        })
    }

    pub fn get(&self) -> Option<&T> {
        self.pipeline.get()
    }
}

pub fn push_constant_ranges<P>(
    stages: wgpu::ShaderStages,
) -> Vec<wgpu::PushConstantRange> {
    if mem::size_of::<P>() > 0 {
        vec![wgpu::PushConstantRange {
            stages,
            range: Range {
                start: 0,
                end: mem::size_of::<P>() as u32,
            },
        }]
    } else {
        vec![]
    }
}

#[derive(Debug)]
pub struct ComputePass<P> {
    label: String,
    bind_groups: Vec<BindGroup>,
    pipeline: Arc<PassPipeline<wgpu::ComputePipeline>>,
    _params: PhantomData<P>,
}

impl<P> ComputePass<P>
where
    P: Pod,
{
    pub fn builder<'a>(label: impl ToString) -> ComputePassBuilder<'a, P> {
        ComputePassBuilder {
            label: label.to_string(),
            bind_groups: Default::default(),
            _params: Default::default(),
        }
    }

    /// Dispatches enough workgroups to cover `size` pixels.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        size: UVec2,
        alternate: bool,
        params: &P,
        timestamp_writes: Option<wgpu::ComputePassTimestampWrites<'_>>,
    ) {
        let Some(pipeline) = self.pipeline.get() else {
            return;
        };

        let label = format!("umbra_{}_pass", self.label);

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
                timestamp_writes,
            });

        pass.set_pipeline(pipeline);

        if mem::size_of::<P>() > 0 {
            pass.set_push_constants(0, bytemuck::bytes_of(params));
        }

        for (bind_group_idx, bind_group) in self.bind_groups.iter().enumerate()
        {
            pass.set_bind_group(
                bind_group_idx as u32,
                bind_group.get(alternate),
                &[],
            );
        }

        let size = (size + 7) / 8;

        pass.dispatch_workgroups(size.x, size.y, 1);
    }
}

pub struct ComputePassBuilder<'a, P> {
    label: String,
    bind_groups: Vec<BindGroupBuilder<'a>>,
    _params: PhantomData<P>,
}

impl<'a, P> ComputePassBuilder<'a, P>
where
    P: Pod,
{
    pub fn bind<const N: usize>(
        mut self,
        items: [&'a dyn DoubleBufferedBindable; N],
    ) -> Self {
        let mut bind_group = BindGroup::builder(format!(
            "{}_bg{}",
            self.label,
            self.bind_groups.len()
        ));

        for item in items {
            bind_group = bind_group.add(item);
        }

        self.bind_groups.push(bind_group);
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        pipeline: &Arc<PassPipeline<wgpu::ComputePipeline>>,
        (module, entry_point): &(wgpu::ShaderModule, &'static str),
    ) -> ComputePass<P> {
        let bind_groups = pipeline.bind_groups(device, self.bind_groups);

        pipeline.get_or_init(|bind_group_layouts| {
            debug!("Initializing pass: {}:{}", self.label, entry_point);

            let push_constant_ranges =
                push_constant_ranges::<P>(wgpu::ShaderStages::COMPUTE);

            let pipeline_layout = device.create_pipeline_layout(
                &wgpu::PipelineLayoutDescriptor {
                    label: Some(&format!(
                        "umbra_{}_pipeline_layout",
                        self.label
                    )),
                    bind_group_layouts,
                    push_constant_ranges: &push_constant_ranges,
                },
            );

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&format!("umbra_{}_pipeline", self.label)),
                layout: Some(&pipeline_layout),
                module,
                entry_point,
            })
        });

        ComputePass {
            label: self.label,
            bind_groups,
            pipeline: Arc::clone(pipeline),
            _params: PhantomData,
        }
    }
}

/// Pass drawing a single full-screen triangle.
#[derive(Debug)]
pub struct RenderPass<P> {
    label: String,
    bind_groups: Vec<BindGroup>,
    pipeline: Arc<PassPipeline<wgpu::RenderPipeline>>,
    _params: PhantomData<P>,
}

impl<P> RenderPass<P>
where
    P: Pod,
{
    pub fn builder<'a>(label: impl ToString) -> RenderPassBuilder<'a, P> {
        RenderPassBuilder {
            label: label.to_string(),
            bind_groups: Default::default(),
            _params: Default::default(),
        }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color: wgpu::RenderPassColorAttachment<'_>,
        depth: Option<wgpu::RenderPassDepthStencilAttachment<'_>>,
        alternate: bool,
        params: &P,
        timestamp_writes: Option<wgpu::RenderPassTimestampWrites<'_>>,
    ) {
        let Some(pipeline) = self.pipeline.get() else {
            return;
        };

        let label = format!("umbra_{}_pass", self.label);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&label),
            color_attachments: &[Some(color)],
            depth_stencil_attachment: depth,
            timestamp_writes,
            occlusion_query_set: None,
        });

        pass.set_pipeline(pipeline);

        if mem::size_of::<P>() > 0 {
            pass.set_push_constants(
                wgpu::ShaderStages::FRAGMENT,
                0,
                bytemuck::bytes_of(params),
            );
        }

        for (bind_group_idx, bind_group) in self.bind_groups.iter().enumerate()
        {
            pass.set_bind_group(
                bind_group_idx as u32,
                bind_group.get(alternate),
                &[],
            );
        }

        pass.draw(0..3, 0..1);
    }
}

pub struct RenderPassBuilder<'a, P> {
    label: String,
    bind_groups: Vec<BindGroupBuilder<'a>>,
    _params: PhantomData<P>,
}

impl<'a, P> RenderPassBuilder<'a, P>
where
    P: Pod,
{
    pub fn bind<const N: usize>(
        mut self,
        items: [&'a dyn DoubleBufferedBindable; N],
    ) -> Self {
        let mut bind_group = BindGroup::builder(format!(
            "{}_bg{}",
            self.label,
            self.bind_groups.len()
        ));

        for item in items {
            bind_group = bind_group.add(item);
        }

        self.bind_groups.push(bind_group);
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        pipeline: &Arc<PassPipeline<wgpu::RenderPipeline>>,
        shaders: RenderShaders<'_>,
    ) -> RenderPass<P> {
        let bind_groups = pipeline.bind_groups(device, self.bind_groups);

        pipeline.get_or_init(|bind_group_layouts| {
            let (vs_module, vs_entry_point) = shaders.vs;
            let (fs_module, fs_entry_point) = shaders.fs;

            debug!("Initializing pass: {}:{}", self.label, fs_entry_point);

            let push_constant_ranges =
                push_constant_ranges::<P>(wgpu::ShaderStages::FRAGMENT);

            let pipeline_layout = device.create_pipeline_layout(
                &wgpu::PipelineLayoutDescriptor {
                    label: Some(&format!(
                        "umbra_{}_pipeline_layout",
                        self.label
                    )),
                    bind_group_layouts,
                    push_constant_ranges: &push_constant_ranges,
                },
            );

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("umbra_{}_pipeline", self.label)),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vs_module,
                    entry_point: vs_entry_point,
                    buffers: &[],
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: shaders.depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: fs_module,
                    entry_point: fs_entry_point,
                    targets: &[Some(shaders.target)],
                }),
                multiview: None,
            })
        });

        RenderPass {
            label: self.label,
            bind_groups,
            pipeline: Arc::clone(pipeline),
            _params: PhantomData,
        }
    }
}

/// Shaders and output state of a [`RenderPass`].
pub struct RenderShaders<'a> {
    pub vs: &'a (wgpu::ShaderModule, &'static str),
    pub fs: &'a (wgpu::ShaderModule, &'static str),
    pub target: wgpu::ColorTargetState,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
}
