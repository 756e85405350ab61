use crate::{
    ComputePass, ComputeVariant, Scene, Stage, StageContext, StageResources,
    Texture,
};

/// Shrinks depth into the half-res target, together with normals
/// reconstructed at full resolution.
#[derive(Debug)]
pub struct DownsamplingStage {
    pass: ComputePass<()>,
}

impl DownsamplingStage {
    pub fn new(
        res: &StageResources<'_>,
        variant: &ComputeVariant,
        output: &Texture,
    ) -> Self {
        let pass = ComputePass::builder("downsampling")
            .bind([
                res.camera,
                &variant.variant,
                &res.targets.beauty.depth.bind_sampled(),
                &output.bind_writable(),
            ])
            .build(
                res.device,
                &variant.pipeline,
                &res.engine.shaders.downsampling,
            );

        Self { pass }
    }
}

impl Stage for DownsamplingStage {
    fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene,
    {
        let timestamps = ctx.compute_timestamps();

        self.pass.run(
            ctx.encoder,
            ctx.targets.ao_size(),
            false,
            &(),
            timestamps,
        );
    }
}
