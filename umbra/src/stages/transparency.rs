use std::sync::Arc;

use crate::{
    gpu, PassPipeline, RenderPass, RenderShaders, RenderStateGuard, Scene,
    SceneTarget, Stage, StageContext, StageResources, TransparencyTarget,
};

/// Renders transparent objects into their own targets, on top of the opaque
/// scene's depth, so that the compositor knows where occlusion should be
/// faded out.
#[derive(Debug)]
pub struct TransparencyStage {
    depth_copy: RenderPass<gpu::DepthCopyPassParams>,
}

impl TransparencyStage {
    pub fn new(
        res: &StageResources<'_>,
        pipeline: &Arc<PassPipeline<wgpu::RenderPipeline>>,
    ) -> Self {
        let shaders = &res.engine.shaders;

        let depth_copy = RenderPass::builder("depth_copy")
            .bind([res.camera, &res.targets.beauty.depth.bind_sampled()])
            .build(
                res.device,
                pipeline,
                RenderShaders {
                    vs: &shaders.depth_copy_vs,
                    fs: &shaders.depth_copy_fs,
                    target: wgpu::ColorTargetState {
                        format: TransparencyTarget::COLOR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: TransparencyTarget::DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Always,
                        stencil: Default::default(),
                        bias: Default::default(),
                    }),
                },
            );

        Self { depth_copy }
    }

    /// Seeds given target: transparent color plus the opaque scene's depth.
    fn seed<S>(
        &self,
        ctx: &mut StageContext<'_, S>,
        target: &TransparencyTarget,
    ) where
        S: Scene,
    {
        let params = gpu::DepthCopyPassParams {
            depth_convention: ctx.config.depth_convention.serialize(),
        };

        self.depth_copy.run(
            ctx.encoder,
            wgpu::RenderPassColorAttachment {
                view: target.color.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            },
            Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            false,
            &params,
            None,
        );
    }

    fn render<S>(
        ctx: &mut StageContext<'_, S>,
        target: &TransparencyTarget,
        objects: &[S::Object],
    ) where
        S: Scene,
    {
        let mut scene = RenderStateGuard::transparent(&mut *ctx.scene);

        scene.render(
            ctx.encoder,
            SceneTarget {
                color: target.color.view(),
                depth: target.depth.view(),
                color_format: TransparencyTarget::COLOR_FORMAT,
                depth_format: TransparencyTarget::DEPTH_FORMAT,
                load: true,
            },
            objects,
        );
    }
}

impl Stage for TransparencyStage {
    fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene,
    {
        let (all_targets, partition) = (ctx.targets, ctx.partition);

        let Some(targets) = &all_targets.transparency else {
            return;
        };

        self.seed(ctx, &targets.no_depth_write);

        Self::render(
            ctx,
            &targets.no_depth_write,
            &partition.transparent_no_depth_write,
        );

        self.seed(ctx, &targets.depth_write);

        Self::render(
            ctx,
            &targets.depth_write,
            &partition.transparent_depth_write,
        );
    }
}
