use std::fmt;
use std::str::FromStr;

use derivative::Derivative;
use glam::Vec3;
use log::warn;

use crate::{gpu, Error};

/// Settings of the ambient occlusion pass.
///
/// Changes are applied through [`crate::AmbientOcclusion::set_configuration()`]
/// (or `update()`), which figures out which resources need rebuilding.
#[derive(Clone, Debug, PartialEq, Derivative)]
#[derivative(Default)]
pub struct Configuration {
    /// Number of hemisphere samples taken per pixel; 1..=64
    #[derivative(Default(value = "16"))]
    pub ao_samples: u32,

    /// Radius of the sampled hemisphere, in world units (or in pixels, when
    /// `screen_space_radius` is set)
    #[derivative(Default(value = "5.0"))]
    pub ao_radius: f32,

    /// Number of shades occlusion gets posterized into; zero disables
    /// posterization; 0..=8
    pub ao_tones: u32,

    /// Number of Poisson-disk taps of the blur; 1..=64
    #[derivative(Default(value = "8"))]
    pub denoise_samples: u32,

    /// Radius of the blur, in pixels
    #[derivative(Default(value = "12.0"))]
    pub denoise_radius: f32,

    /// Number of blur passes; 0..=10
    #[derivative(Default(value = "2"))]
    pub denoise_iterations: u32,

    /// How quickly occluders lose influence as they get farther away from the
    /// sampled point; zero disables the range check
    #[derivative(Default(value = "1.0"))]
    pub distance_falloff: f32,

    /// Exponent applied to the occlusion
    #[derivative(Default(value = "5.0"))]
    pub intensity: f32,

    pub render_mode: RenderMode,
    pub bias_offset: f32,
    pub bias_multiplier: f32,

    /// Color of the occlusion, sRGB-encoded
    pub color: Vec3,

    #[derivative(Default(value = "true"))]
    pub gamma_correction: bool,

    pub depth_convention: DepthConvention,

    /// Whether `ao_radius` is expressed in pixels instead of world units
    pub screen_space_radius: bool,

    /// Whether occlusion is computed at half of the screen's resolution
    pub half_res: bool,

    /// Whether half-res occlusion is upsampled with depth-aware weights (as
    /// opposed to nearest-neighbour)
    #[derivative(Default(value = "true"))]
    pub depth_aware_upsampling: bool,

    /// Whether the beauty target gets rendered by us, before estimating
    /// occlusion; when disabled, caller is expected to render it themselves
    /// through [`crate::AmbientOcclusion::beauty()`]
    #[derivative(Default(value = "true"))]
    pub auto_render_beauty: bool,

    /// Whether occlusion darkens the scene (as opposed to being blended over
    /// it)
    #[derivative(Default(value = "true"))]
    pub color_multiply: bool,

    /// Whether transparent objects get rendered into separate targets, so
    /// that they don't receive occlusion of what's behind them
    pub transparency_aware: bool,

    /// Whether the beauty target carries a stencil buffer
    pub stencil: bool,

    /// Whether a static camera accumulates occlusion over multiple frames
    pub accumulate: bool,
}

impl Configuration {
    pub const MAX_SAMPLES: u32 = gpu::MAX_SAMPLES as u32;
    pub const MAX_DENOISE_ITERATIONS: u32 = 10;
    pub const MAX_AO_TONES: u32 = 8;

    /// Returns a copy of this configuration with out-of-range values clamped.
    pub fn sanitized(mut self) -> Self {
        fn clamp(name: &str, value: &mut u32, min: u32, max: u32) {
            let clamped = (*value).clamp(min, max);

            if clamped != *value {
                warn!("{name}={value} is out of range; using {clamped}");

                *value = clamped;
            }
        }

        clamp("ao_samples", &mut self.ao_samples, 1, Self::MAX_SAMPLES);

        clamp(
            "denoise_samples",
            &mut self.denoise_samples,
            1,
            Self::MAX_SAMPLES,
        );

        clamp(
            "denoise_iterations",
            &mut self.denoise_iterations,
            0,
            Self::MAX_DENOISE_ITERATIONS,
        );

        clamp("ao_tones", &mut self.ao_tones, 0, Self::MAX_AO_TONES);

        self
    }

    pub fn with_quality_mode(mut self, mode: QualityMode) -> Self {
        let (ao_samples, denoise_samples, denoise_radius) = mode.settings();

        self.ao_samples = ao_samples;
        self.denoise_samples = denoise_samples;
        self.denoise_radius = denoise_radius;
        self
    }
}

/// Preset of sample counts trading quality for performance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualityMode {
    Performance,
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityMode {
    /// Returns `(ao_samples, denoise_samples, denoise_radius)`.
    pub fn settings(self) -> (u32, u32, f32) {
        match self {
            QualityMode::Performance => (8, 4, 12.0),
            QualityMode::Low => (16, 4, 12.0),
            QualityMode::Medium => (16, 8, 12.0),
            QualityMode::High => (64, 8, 6.0),
            QualityMode::Ultra => (64, 16, 6.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Scene with occlusion applied
    #[default]
    Combined,

    /// Just the occlusion
    AoOnly,

    /// Just the scene
    NoAo,

    /// Left half shows `Combined`, right half shows `NoAo`
    Split,

    /// Left half shows `AoOnly`, right half shows `Combined`
    SplitAo,
}

impl RenderMode {
    pub(crate) fn serialize(self) -> u32 {
        match self {
            RenderMode::Combined => gpu::RenderMode::COMBINED,
            RenderMode::AoOnly => gpu::RenderMode::AO_ONLY,
            RenderMode::NoAo => gpu::RenderMode::NO_AO,
            RenderMode::Split => gpu::RenderMode::SPLIT,
            RenderMode::SplitAo => gpu::RenderMode::SPLIT_AO,
        }
    }

    fn name(self) -> &'static str {
        match self {
            RenderMode::Combined => "Combined",
            RenderMode::AoOnly => "AO",
            RenderMode::NoAo => "No AO",
            RenderMode::Split => "Split",
            RenderMode::SplitAo => "Split AO",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RenderMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "Combined" => Self::Combined,
            "AO" => Self::AoOnly,
            "No AO" => Self::NoAo,
            "Split" => Self::Split,
            "Split AO" => Self::SplitAo,
            _ => return Err(Error::UnknownRenderMode(value.to_owned())),
        })
    }
}

/// Describes what the depth buffer contains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthConvention {
    /// NDC depth produced by the camera's projection matrix
    #[default]
    Linear,

    /// `log2(1 + distance) / log2(1 + far)`
    Logarithmic,

    /// NDC depth produced by a reversed projection matrix
    ReverseZ,
}

impl DepthConvention {
    pub(crate) fn serialize(self) -> u32 {
        match self {
            DepthConvention::Linear => gpu::DepthModel::LINEAR,
            DepthConvention::Logarithmic => gpu::DepthModel::LOGARITHMIC,
            DepthConvention::ReverseZ => gpu::DepthModel::REVERSE_Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::default();

        assert_eq!(16, config.ao_samples);
        assert_eq!(5.0, config.ao_radius);
        assert_eq!(0, config.ao_tones);
        assert_eq!(8, config.denoise_samples);
        assert_eq!(12.0, config.denoise_radius);
        assert_eq!(2, config.denoise_iterations);
        assert_eq!(1.0, config.distance_falloff);
        assert_eq!(5.0, config.intensity);
        assert_eq!(RenderMode::Combined, config.render_mode);
        assert_eq!(Vec3::ZERO, config.color);
        assert!(config.gamma_correction);
        assert_eq!(DepthConvention::Linear, config.depth_convention);
        assert!(!config.screen_space_radius);
        assert!(!config.half_res);
        assert!(config.depth_aware_upsampling);
        assert!(config.auto_render_beauty);
        assert!(config.color_multiply);
        assert!(!config.transparency_aware);
        assert!(!config.stencil);
        assert!(!config.accumulate);
    }

    #[test]
    fn sanitized() {
        let config = Configuration {
            ao_samples: 0,
            denoise_samples: 100,
            denoise_iterations: 11,
            ao_tones: 9,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(1, config.ao_samples);
        assert_eq!(64, config.denoise_samples);
        assert_eq!(10, config.denoise_iterations);
        assert_eq!(8, config.ao_tones);

        let config = Configuration {
            denoise_iterations: 0,
            ..Default::default()
        };

        assert_eq!(config.clone(), config.sanitized());
    }

    #[test]
    fn quality_modes() {
        let cases = [
            (QualityMode::Performance, 8, 4, 12.0),
            (QualityMode::Low, 16, 4, 12.0),
            (QualityMode::Medium, 16, 8, 12.0),
            (QualityMode::High, 64, 8, 6.0),
            (QualityMode::Ultra, 64, 16, 6.0),
        ];

        for (mode, ao_samples, denoise_samples, denoise_radius) in cases {
            let config = Configuration::default().with_quality_mode(mode);

            assert_eq!(ao_samples, config.ao_samples, "{mode:?}");
            assert_eq!(denoise_samples, config.denoise_samples, "{mode:?}");
            assert_eq!(denoise_radius, config.denoise_radius, "{mode:?}");
        }
    }

    #[test]
    fn render_modes() {
        let modes = [
            RenderMode::Combined,
            RenderMode::AoOnly,
            RenderMode::NoAo,
            RenderMode::Split,
            RenderMode::SplitAo,
        ];

        for mode in modes {
            assert_eq!(mode, mode.to_string().parse().unwrap());
        }

        assert_eq!(RenderMode::NoAo, "No AO".parse().unwrap());
        assert!("no ao".parse::<RenderMode>().is_err());
    }
}
