//! Common structs and algorithms used by Umbra's shaders and renderer.
//!
//! Everything here compiles both for the GPU (through rust-gpu) and for the
//! host, which is how the estimators get tested.

#![cfg_attr(target_arch = "spirv", no_std)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::too_many_arguments)]

mod camera;
mod composition;
mod denoise;
mod depth;
mod downsample;
mod noise;
mod normal;
mod occlusion;
mod passes;
mod samples;
mod utils;
mod variant;

#[cfg(test)]
mod test_scene;

pub use self::camera::*;
pub use self::composition::*;
pub use self::denoise::*;
pub use self::depth::*;
pub use self::downsample::*;
pub use self::noise::*;
pub use self::normal::*;
pub use self::occlusion::*;
pub use self::passes::*;
pub use self::samples::*;
pub use self::utils::*;
pub use self::variant::*;

pub mod prelude {
    pub use core::f32::consts::PI;

    pub use spirv_std::glam::*;
    #[cfg(target_arch = "spirv")]
    pub use spirv_std::num_traits::Float;
    pub use spirv_std::{spirv, Image};

    pub use crate::*;
}

/// Golden angle, used to spread samples around a disk.
pub const GOLDEN_ANGLE: f32 = 2.399963;

/// Maximum number of samples any estimator can be built with.
pub const MAX_SAMPLES: usize = 64;
