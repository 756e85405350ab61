#![cfg_attr(target_arch = "spirv", no_std)]

pub mod accumulation;
pub mod composition;
pub mod denoising;
pub mod depth_copy;
pub mod downsampling;
pub mod occlusion;
