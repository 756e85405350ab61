use glam::UVec2;

use super::downsampled_or_placeholder;
use crate::{
    gpu, AccumulationStep, ComputePass, ComputeVariant, Configuration, Scene,
    Stage, StageContext, StageResources,
};

/// Estimates occlusion into the current half of the ping-pong pair.
#[derive(Debug)]
pub struct OcclusionStage {
    pass: ComputePass<gpu::OcclusionPassParams>,
}

impl OcclusionStage {
    pub fn new(res: &StageResources<'_>, variant: &ComputeVariant) -> Self {
        let targets = res.targets;

        let pass = ComputePass::builder("occlusion")
            .bind([
                res.camera,
                &variant.variant,
                &res.samples.hemisphere,
                &res.engine.blue_noise.bind_sampled(),
                &targets.beauty.depth.bind_sampled(),
                &downsampled_or_placeholder(targets).bind_sampled(),
            ])
            .bind([&targets.occlusion.forward().bind_writable()])
            .build(res.device, &variant.pipeline, &res.engine.shaders.occlusion);

        Self { pass }
    }
}

impl Stage for OcclusionStage {
    fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene,
    {
        let size = ctx.targets.ao_size();

        let params = params(ctx.config, size, ctx.step);
        let timestamps = ctx.compute_timestamps();

        self.pass.run(ctx.encoder, size, false, &params, timestamps);
    }
}

/// Noise is animated by the accumulation frame, so a still image without
/// accumulation keeps the same pattern.
fn params(
    config: &Configuration,
    size: UVec2,
    step: AccumulationStep,
) -> gpu::OcclusionPassParams {
    gpu::OcclusionPassParams {
        resolution: size.as_vec2(),
        radius: config.ao_radius,
        distance_falloff: config.distance_falloff,
        bias_offset: config.bias_offset,
        bias_multiplier: config.bias_multiplier,
        frame: step.frame,
        screen_space_radius: config.screen_space_radius as u32,
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec3, Mat4, Vec3};

    use super::*;
    use crate::AccumulationController;

    fn noise_frames(
        config: &Configuration,
        views: impl IntoIterator<Item = Mat4>,
    ) -> Vec<u32> {
        let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);
        let mut accumulation = AccumulationController::default();

        views
            .into_iter()
            .map(|view| {
                let step = accumulation.begin_frame(
                    view,
                    projection,
                    config.accumulate,
                    config.ao_samples,
                );

                params(config, uvec2(64, 32), step).frame
            })
            .collect()
    }

    #[test]
    fn noise_follows_accumulation() {
        let still = Mat4::look_at_rh(vec3(0.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y);
        let moved = Mat4::look_at_rh(vec3(0.0, 1.0, 6.0), Vec3::ZERO, Vec3::Y);

        let mut config = Configuration {
            accumulate: true,
            ..Default::default()
        };

        assert_eq!(
            vec![0, 1, 2, 0, 1, 2],
            noise_frames(&config, [still, still, still, moved, moved, moved]),
        );

        config.accumulate = false;

        assert_eq!(
            vec![0; 6],
            noise_frames(&config, [still, still, still, moved, moved, moved]),
        );
    }

    #[test]
    fn forwards_configuration() {
        let config = Configuration::default();
        let step = AccumulationStep {
            frame: 7,
            clear: false,
            estimate: true,
            weight: 0.125,
        };

        let actual = params(&config, uvec2(64, 32), step);

        assert_eq!(64.0, actual.resolution.x);
        assert_eq!(32.0, actual.resolution.y);
        assert_eq!(config.ao_radius, actual.radius);
        assert_eq!(config.distance_falloff, actual.distance_falloff);
        assert_eq!(7, actual.frame);
    }
}
