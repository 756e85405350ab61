use crate::{Scene, SceneTarget, Stage, StageContext};

/// Renders the whole scene into the beauty target.
#[derive(Debug)]
pub struct BeautyStage;

impl Stage for BeautyStage {
    fn execute<S>(&self, ctx: &mut StageContext<'_, S>)
    where
        S: Scene,
    {
        let beauty = &ctx.targets.beauty;
        let objects: Vec<_> = ctx.partition.iter().cloned().collect();

        ctx.scene.render(
            ctx.encoder,
            SceneTarget {
                color: beauty.color.view(),
                depth: beauty.depth.view(),
                color_format: beauty.color.format(),
                depth_format: beauty.depth.format(),
                load: false,
            },
            &objects,
        );
    }
}
