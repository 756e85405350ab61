use std::mem;
use std::sync::Arc;

use glam::{vec4, UVec2, Vec4};
use log::{debug, error, info};

use crate::{
    gpu, AccumulationController, BeautyTarget, Camera, CompositeKey,
    Configuration, ConfigurationReactor, DenoiseKey, DownsampleKey, Engine,
    Fog, MappedUniformBuffer, OcclusionKey, QualityMode, Rebuild, RebuildPlan,
    RenderMode, SampleSets, Scene, StageContext, StageResources, StageVariants,
    Stages, Targets, TimingProbe, Variants,
};

/// Screen-space ambient occlusion applied onto a scene.
///
/// Owns everything it renders into (see [`Targets`]); the scene itself is
/// provided on each [`Self::render()`] through the [`Scene`] trait.
pub struct AmbientOcclusion {
    reactor: ConfigurationReactor,
    pending: RebuildPlan,

    /// Whether user has chosen `transparency_aware` themselves; if not, it
    /// follows whatever the scene contains
    transparency_explicit: bool,

    size: UVec2,
    output_format: wgpu::TextureFormat,
    targets: Targets,
    samples: SampleSets,
    camera: MappedUniformBuffer<gpu::Camera>,
    variants: Variants,
    stages: Option<Stages>,
    ortho: bool,
    accumulation: AccumulationController,
    timing: Option<TimingProbe>,
    fog_error_logged: bool,
}

impl AmbientOcclusion {
    pub fn new(
        device: &wgpu::Device,
        size: UVec2,
        output_format: wgpu::TextureFormat,
        config: Configuration,
    ) -> Self {
        let size = size.max(UVec2::ONE);

        info!(
            "Creating ambient occlusion; size={size:?}, format={output_format:?}"
        );

        let transparency_explicit = config.transparency_aware;
        let reactor = ConfigurationReactor::new(config);
        let targets = Targets::new(device, size, reactor.config());
        let samples = SampleSets::new(device, reactor.config());

        Self {
            reactor,
            pending: Default::default(),
            transparency_explicit,
            size,
            output_format,
            targets,
            samples,
            camera: MappedUniformBuffer::new(
                device,
                "umbra_camera",
                Default::default(),
            ),
            variants: Default::default(),
            stages: None,
            ortho: false,
            accumulation: Default::default(),
            timing: None,
            fog_error_logged: false,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        self.reactor.config()
    }

    /// Switches to given configuration; whatever has to be rebuilt because
    /// of it gets rebuilt at the beginning of the next frame.
    pub fn set_configuration(&mut self, config: Configuration) -> RebuildPlan {
        if config.transparency_aware != self.configuration().transparency_aware
        {
            self.transparency_explicit = true;
        }

        let plan = self.reactor.apply(config);

        if !plan.is_empty() {
            debug!("Configuration changed; scheduled: {plan:?}");
        }

        self.pending.merge(plan);

        plan
    }

    pub fn update(&mut self, f: impl FnOnce(&mut Configuration)) -> RebuildPlan {
        let mut config = self.configuration().clone();

        f(&mut config);

        self.set_configuration(config)
    }

    pub fn set_quality_mode(&mut self, mode: QualityMode) -> RebuildPlan {
        self.update(|config| {
            *config = config.clone().with_quality_mode(mode);
        })
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) -> RebuildPlan {
        self.update(|config| {
            config.render_mode = mode;
        })
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Changes the output's size; targets get reallocated before the next
    /// frame.
    pub fn set_size(&mut self, size: UVec2) {
        let size = size.max(UVec2::ONE);

        if size == self.size {
            return;
        }

        debug!("Resizing to {size:?}");

        self.size = size;
        self.pending.insert(Rebuild::Resize);
        self.pending.insert(Rebuild::FreshFrame);
    }

    /// Starts measuring how long the GPU spends on ambient occlusion; does
    /// nothing if the device doesn't support timestamp queries.
    pub fn enable_debug_mode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        if self.timing.is_none() {
            self.timing = TimingProbe::new(device, queue);
        }
    }

    pub fn disable_debug_mode(&mut self) {
        self.timing = None;
    }

    pub fn is_debug_mode(&self) -> bool {
        self.timing.is_some()
    }

    /// Returns smoothed GPU time of the most recent frames, in milliseconds;
    /// zero if debug mode is disabled or no measurement has finished yet.
    pub fn last_time(&self) -> f32 {
        self.timing
            .as_ref()
            .map(|timing| timing.last_time())
            .unwrap_or_default()
    }

    /// Collects timings; must be called after the encoder passed to
    /// [`Self::render()`] has been submitted.
    pub fn poll(&mut self, device: &wgpu::Device) {
        if let Some(timing) = &mut self.timing {
            timing.poll(device);
        }
    }

    /// Returns the target scene gets rendered into; when
    /// `auto_render_beauty` is disabled, it's up to the caller to fill it
    /// before each [`Self::render()`].
    pub fn beauty(&self) -> &BeautyTarget {
        &self.targets.beauty
    }

    /// Records a frame into given encoder, writing the result into `output`.
    #[allow(clippy::too_many_arguments)]
    pub fn render<S>(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        scene: &mut S,
        output: &wgpu::TextureView,
    ) where
        S: Scene,
    {
        let camera = scene.camera();
        let partition = scene.partition();

        self.sync(&camera, partition.has_transparency());

        let plan = mem::take(&mut self.pending);

        if !plan.is_empty() {
            self.rebuild(device, plan);
        }

        let ortho = camera.is_orthographic();

        if ortho != self.ortho {
            debug!("Camera changed: {}", camera.describe());

            self.ortho = ortho;
            self.stages = None;
            self.accumulation.invalidate();
        }

        let step = {
            let config = self.reactor.config();

            self.accumulation.begin_frame(
                camera.view,
                camera.projection,
                config.accumulate,
                config.ao_samples,
            )
        };

        self.camera.set(camera.serialize(self.size));
        self.camera.flush(queue);

        let fog = self.fog(scene.fog());

        if self.stages.is_none() {
            self.stages = Some(self.build_stages(engine, device, queue));
        }

        if let Some(stages) = &self.stages {
            let mut ctx = StageContext {
                encoder: &mut *encoder,
                config: self.reactor.config(),
                targets: &self.targets,
                step,
                fog,
                scene: &mut *scene,
                partition: &partition,
                output,
                timing: self.timing.as_ref(),
                timing_begun: false,
            };

            stages.execute(&mut ctx);
        }

        if let Some(timing) = &mut self.timing {
            timing.resolve(encoder);
        }
    }

    /// Adjusts configuration to what the scene contains.
    fn sync(&mut self, camera: &Camera, has_transparency: bool) {
        let mut config = self.reactor.config().clone();

        if config.depth_convention != camera.depth_convention {
            debug!(
                "Camera uses {:?}, switching depth convention",
                camera.depth_convention
            );

            config.depth_convention = camera.depth_convention;
        }

        if !self.transparency_explicit {
            config.transparency_aware = has_transparency;
        }

        let plan = self.reactor.apply(config);

        if !plan.is_empty() {
            debug!("Scene changed; scheduled: {plan:?}");
        }

        self.pending.merge(plan);
    }

    fn rebuild(&mut self, device: &wgpu::Device, plan: RebuildPlan) {
        debug!("Rebuilding: {plan:?}");

        let config = self.reactor.config();

        for action in plan.iter() {
            match action {
                Rebuild::Resize => {
                    self.targets.resize(device, self.size, config);
                }

                Rebuild::BeautyTarget => {
                    if !plan.contains(Rebuild::Resize) {
                        self.targets.rebuild_beauty(device, config.stencil);
                    }
                }

                Rebuild::DownsampleTarget => {
                    if !plan.contains(Rebuild::Resize) {
                        self.targets
                            .rebuild_downsampled(device, config.half_res);
                    }
                }

                Rebuild::TransparencyTargets => {
                    self.targets.rebuild_transparency(
                        device,
                        config.transparency_aware,
                    );
                }

                Rebuild::HemisphereSamples => {
                    self.samples.rebuild_hemisphere(device, config.ao_samples);
                }

                Rebuild::PoissonSamples => {
                    self.samples
                        .rebuild_poisson(device, config.denoise_samples);
                }

                // Variants get looked up when the stages are rebuilt
                Rebuild::EstimatorVariant
                | Rebuild::DenoiseVariant
                | Rebuild::CompositeVariant => (),

                Rebuild::FreshFrame => {
                    self.accumulation.invalidate();
                }
            }
        }

        if plan.needs_rebuilding() {
            self.stages = None;
        }
    }

    fn build_stages(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Stages {
        let config = self.reactor.config();
        let ortho = self.ortho;

        let variants = StageVariants {
            downsampling: self.variants.downsampling(
                device,
                queue,
                DownsampleKey::new(config, ortho),
            ),
            occlusion: self.variants.occlusion(
                device,
                queue,
                OcclusionKey::new(config, ortho),
            ),
            denoising: self.variants.denoising(
                device,
                queue,
                DenoiseKey::new(config, ortho),
                config.half_res,
            ),
            composition: self.variants.composition(
                device,
                queue,
                CompositeKey::new(config, ortho),
            ),
            accumulation: Arc::clone(&self.variants.accumulation),
            depth_copy: Arc::clone(&self.variants.depth_copy),
        };

        Stages::new(
            &StageResources {
                engine,
                device,
                targets: &self.targets,
                camera: &self.camera,
                samples: &self.samples,
                output_format: self.output_format,
            },
            &variants,
        )
    }

    fn fog(&mut self, fog: Option<Fog>) -> Vec4 {
        match serialize_fog(fog.as_ref()) {
            Ok(fog) => fog,

            Err(model) => {
                if !mem::replace(&mut self.fog_error_logged, true) {
                    error!(
                        "Fog model `{model}` is not supported; occlusion \
                         won't be faded out with distance"
                    );
                }

                Vec4::ZERO
            }
        }
    }
}

impl Drop for AmbientOcclusion {
    fn drop(&mut self) {
        info!("Deleting ambient occlusion");
    }
}

/// Converts fog into what the compositor expects; unsupported models are
/// returned as an error.
fn serialize_fog(fog: Option<&Fog>) -> Result<Vec4, &str> {
    match fog {
        None => Ok(Vec4::ZERO),

        Some(Fog::Linear { near, far }) => {
            Ok(vec4(gpu::Fog::LINEAR as f32, *near, *far, 0.0))
        }

        Some(Fog::ExponentialSquared { density }) => Ok(vec4(
            gpu::Fog::EXPONENTIAL_SQUARED as f32,
            0.0,
            0.0,
            *density,
        )),

        Some(Fog::Unsupported(model)) => Err(model),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog() {
        assert_eq!(Ok(Vec4::ZERO), serialize_fog(None));

        assert_eq!(
            Ok(vec4(1.0, 10.0, 20.0, 0.0)),
            serialize_fog(Some(&Fog::Linear {
                near: 10.0,
                far: 20.0
            }))
        );

        assert_eq!(
            Ok(vec4(2.0, 0.0, 0.0, 0.25)),
            serialize_fog(Some(&Fog::ExponentialSquared { density: 0.25 }))
        );

        assert_eq!(
            Err("FogExp"),
            serialize_fog(Some(&Fog::Unsupported("FogExp".into())))
        );
    }
}
