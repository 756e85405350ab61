use std::sync::Arc;

use crate::{
    gpu, PassPipeline, RenderPass, RenderShaders, Scene, Stage, StageContext,
    StageResources, Targets,
};

/// Blends freshly denoised occlusion into the accumulation buffer.
#[derive(Debug)]
pub struct AccumulationStage {
    pass: RenderPass<gpu::AccumulationPassParams>,
}

impl AccumulationStage {
    pub fn new(
        res: &StageResources<'_>,
        pipeline: &Arc<PassPipeline<wgpu::RenderPipeline>>,
    ) -> Self {
        let shaders = &res.engine.shaders;

        let pass = RenderPass::builder("accumulation")
            .bind([&res.targets.occlusion.forward().bind_sampled()])
            .build(
                res.device,
                pipeline,
                RenderShaders {
                    vs: &shaders.accumulation_vs,
                    fs: &shaders.accumulation_fs,
                    target: wgpu::ColorTargetState {
                        format: Targets::OCCLUSION_FORMAT,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    },
                    depth_stencil: None,
                },
            );

        Self { pass }
    }
}

impl Stage for AccumulationStage {
    fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene,
    {
        let load = if ctx.step.clear {
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
        } else {
            wgpu::LoadOp::Load
        };

        let params = gpu::AccumulationPassParams {
            weight: ctx.step.weight,
        };

        self.pass.run(
            ctx.encoder,
            wgpu::RenderPassColorAttachment {
                view: ctx.targets.accumulation.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            },
            None,
            gpu::denoised_buffer(ctx.config.denoise_iterations),
            &params,
            None,
        );
    }
}
