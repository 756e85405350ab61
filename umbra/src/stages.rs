mod accumulation;
mod beauty;
mod composition;
mod denoising;
mod downsampling;
mod occlusion;
mod transparency;

use std::sync::Arc;

use glam::Vec4;
use log::debug;

pub use self::accumulation::*;
pub use self::beauty::*;
pub use self::composition::*;
pub use self::denoising::*;
pub use self::downsampling::*;
pub use self::occlusion::*;
pub use self::transparency::*;
use crate::{
    gpu, AccumulationStep, ComputeVariant, Configuration, Engine,
    MappedUniformBuffer, PassPipeline, RenderVariant, SampleSets, Scene,
    ScenePartition, Targets, TimingProbe,
};

/// Single step of a frame.
pub trait Stage {
    fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene;
}

/// Everything a stage might need while recording a frame.
pub struct StageContext<'a, S>
where
    S: Scene,
{
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub config: &'a Configuration,
    pub targets: &'a Targets,

    /// Accumulation state of this frame; its frame index animates noise
    pub step: AccumulationStep,

    /// Fog, already serialized for the compositor
    pub fog: Vec4,

    pub scene: &'a mut S,
    pub partition: &'a ScenePartition<S::Object>,
    pub output: &'a wgpu::TextureView,
    pub timing: Option<&'a TimingProbe>,

    /// Whether the beginning timestamp has been written already
    pub timing_begun: bool,
}

impl<'a, S> StageContext<'a, S>
where
    S: Scene,
{
    /// Returns timestamp writes for a compute pass; only the first pass of
    /// the frame gets them.
    pub fn compute_timestamps(
        &mut self,
    ) -> Option<wgpu::ComputePassTimestampWrites<'a>> {
        let timing = self.timing?;

        if self.timing_begun {
            return None;
        }

        self.timing_begun = true;

        Some(timing.compute_begin())
    }

    /// Returns timestamp writes for the last pass of the frame.
    pub fn final_timestamps(
        &mut self,
    ) -> Option<wgpu::RenderPassTimestampWrites<'a>> {
        let timing = self.timing?;
        let begin = !self.timing_begun;

        self.timing_begun = true;

        Some(timing.render_end(begin))
    }
}

/// Resources the stages get built from.
pub struct StageResources<'a> {
    pub engine: &'a Engine,
    pub device: &'a wgpu::Device,
    pub targets: &'a Targets,
    pub camera: &'a MappedUniformBuffer<gpu::Camera>,
    pub samples: &'a SampleSets,
    pub output_format: wgpu::TextureFormat,
}

/// Pipelines the stages get built with, picked from the variant caches.
pub struct StageVariants {
    pub downsampling: Arc<ComputeVariant>,
    pub occlusion: Arc<ComputeVariant>,
    pub denoising: Arc<ComputeVariant>,
    pub composition: Arc<RenderVariant>,
    pub accumulation: Arc<PassPipeline<wgpu::RenderPipeline>>,
    pub depth_copy: Arc<PassPipeline<wgpu::RenderPipeline>>,
}

#[derive(Debug)]
pub struct Stages {
    pub beauty: BeautyStage,
    pub downsampling: Option<DownsamplingStage>,
    pub occlusion: OcclusionStage,
    pub denoising: DenoisingStage,
    pub accumulation: AccumulationStage,
    pub transparency: Option<TransparencyStage>,
    pub composition: CompositionStage,
}

impl Stages {
    pub fn new(res: &StageResources<'_>, variants: &StageVariants) -> Self {
        debug!("Initializing stages");

        Self {
            beauty: BeautyStage,
            downsampling: res.targets.downsampled.as_ref().map(|output| {
                DownsamplingStage::new(res, &variants.downsampling, output)
            }),
            occlusion: OcclusionStage::new(res, &variants.occlusion),
            denoising: DenoisingStage::new(res, &variants.denoising),
            accumulation: AccumulationStage::new(res, &variants.accumulation),
            transparency: res.targets.transparency.is_some().then(|| {
                TransparencyStage::new(res, &variants.depth_copy)
            }),
            composition: CompositionStage::new(res, &variants.composition),
        }
    }

    /// Records the whole frame.
    pub fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene,
    {
        if ctx.config.auto_render_beauty {
            self.beauty.execute(ctx);
        }

        if ctx.step.estimate {
            if let Some(downsampling) = &self.downsampling {
                downsampling.execute(ctx);
            }

            self.occlusion.execute(ctx);
            self.denoising.execute(ctx);
            self.accumulation.execute(ctx);
        }

        if let Some(transparency) = &self.transparency {
            transparency.execute(ctx);
        }

        self.composition.execute(ctx);
    }
}

/// Picks texture bound for the downsampled depth and normals, which the
/// shaders ignore in full-res mode.
fn downsampled_or_placeholder(targets: &Targets) -> &crate::Texture {
    targets
        .downsampled
        .as_ref()
        .unwrap_or(&targets.placeholder)
}
