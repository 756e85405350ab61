use glam::Vec4;

use super::downsampled_or_placeholder;
use crate::gpu::Vec3Ext;
use crate::{
    gpu, Configuration, RenderPass, RenderShaders, RenderVariant, Scene, Stage,
    StageContext, StageResources, Targets,
};

/// Applies occlusion onto the beauty target, writing the final image into
/// the output view.
#[derive(Debug)]
pub struct CompositionStage {
    pass: RenderPass<gpu::CompositionPassParams>,
}

impl CompositionStage {
    pub fn new(res: &StageResources<'_>, variant: &RenderVariant) -> Self {
        let targets = res.targets;
        let shaders = &res.engine.shaders;
        let placeholder = &targets.placeholder;

        let (ndw_color, dw_color, dw_depth) = match &targets.transparency {
            Some(transparency) => (
                &transparency.no_depth_write.color,
                &transparency.depth_write.color,
                &transparency.depth_write.depth,
            ),
            None => (placeholder, placeholder, placeholder),
        };

        let pass = RenderPass::builder("composition")
            .bind([
                res.camera,
                &variant.variant,
                &targets.beauty.color.bind_sampled(),
                &targets.beauty.depth.bind_sampled(),
                &targets.accumulation.bind_sampled(),
                &downsampled_or_placeholder(targets).bind_sampled(),
                &ndw_color.bind_sampled(),
                &dw_color.bind_sampled(),
                &dw_depth.bind_sampled(),
            ])
            .build(
                res.device,
                &variant.pipeline,
                RenderShaders {
                    vs: &shaders.composition_vs,
                    fs: &shaders.composition_fs,
                    target: wgpu::ColorTargetState {
                        format: res.output_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    },
                    depth_stencil: None,
                },
            );

        Self { pass }
    }
}

impl Stage for CompositionStage {
    fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene,
    {
        let params = params(ctx.config, ctx.targets, ctx.fog);
        let timestamps = ctx.final_timestamps();

        self.pass.run(
            ctx.encoder,
            wgpu::RenderPassColorAttachment {
                view: ctx.output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            },
            None,
            false,
            &params,
            timestamps,
        );
    }
}

fn params(
    config: &Configuration,
    targets: &Targets,
    fog: Vec4,
) -> gpu::CompositionPassParams {
    let mut flags = 0;

    if config.color_multiply {
        flags |= gpu::CompositionPassParams::FLAG_COLOR_MULTIPLY;
    }

    if config.gamma_correction {
        flags |= gpu::CompositionPassParams::FLAG_GAMMA_CORRECTION;
    }

    if targets.transparency.is_some() {
        flags |= gpu::CompositionPassParams::FLAG_TRANSPARENCY;
    }

    gpu::CompositionPassParams {
        color: config.color.srgb_to_linear().extend(config.intensity),
        fog,
        ao_resolution: targets.ao_size().as_vec2(),
        ao_tones: config.ao_tones as f32,
        render_mode: config.render_mode.serialize(),
        flags,
        ..Default::default()
    }
}
