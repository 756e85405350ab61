use glam::UVec2;

use super::downsampled_or_placeholder;
use crate::{
    gpu, AccumulationStep, ComputePass, ComputeVariant, Configuration, Scene,
    Stage, StageContext, StageResources,
};

/// Blurs occlusion back and forth between the ping-pong pair.
///
/// Iteration `i` reads the buffer written by iteration `i - 1` (or by the
/// estimator), so where the result ends up depends on the number of
/// iterations; see [`gpu::denoised_buffer()`].
#[derive(Debug)]
pub struct DenoisingStage {
    pass: ComputePass<gpu::DenoisePassParams>,
}

impl DenoisingStage {
    pub fn new(res: &StageResources<'_>, variant: &ComputeVariant) -> Self {
        let targets = res.targets;

        let pass = ComputePass::builder("denoising")
            .bind([
                res.camera,
                &variant.variant,
                &res.samples.poisson,
                &res.engine.blue_noise.bind_sampled(),
                &targets.beauty.depth.bind_sampled(),
                &downsampled_or_placeholder(targets).bind_sampled(),
            ])
            .bind([
                &targets.occlusion.forward().bind_sampled(),
                &targets.occlusion.backward().bind_writable(),
            ])
            .build(res.device, &variant.pipeline, &res.engine.shaders.denoising);

        Self { pass }
    }
}

impl Stage for DenoisingStage {
    fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene,
    {
        let size = ctx.targets.ao_size();

        for iteration in 0..ctx.config.denoise_iterations {
            let params = params(ctx.config, size, ctx.step, iteration);

            self.pass
                .run(ctx.encoder, size, iteration % 2 == 1, &params, None);
        }
    }
}

fn params(
    config: &Configuration,
    size: UVec2,
    step: AccumulationStep,
    iteration: u32,
) -> gpu::DenoisePassParams {
    gpu::DenoisePassParams {
        resolution: size.as_vec2(),
        radius: config.denoise_radius,
        ao_radius: config.ao_radius,
        distance_falloff: config.distance_falloff,
        iteration,
        frame: step.frame,
        screen_space_radius: config.screen_space_radius as u32,
    }
}
