use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "shader `{id}` hasn't been compiled; make sure the rust-gpu toolchain \
         is available when building Umbra"
    )]
    ShaderNotCompiled { id: &'static str },

    #[error("couldn't read shader `{id}`")]
    ShaderUnreadable {
        id: &'static str,

        #[source]
        source: io::Error,
    },

    #[error("device doesn't support required features: {0:?}")]
    MissingFeatures(wgpu::Features),

    #[error("blue noise must be 128x128, got {width}x{height}")]
    InvalidBlueNoise { width: u32, height: u32 },

    #[error("couldn't decode blue noise")]
    Image(#[from] image::ImageError),

    #[error("unknown render mode: {0:?}")]
    UnknownRenderMode(String),
}
