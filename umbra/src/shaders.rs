use std::fs;

use log::debug;

use crate::Error;

macro_rules! shaders {
    ([ $( $name:ident, )* ]) => {
        /// Compiled shader modules, paired with their entry points.
        #[derive(Debug)]
        pub struct Shaders {
            $( pub $name: (wgpu::ShaderModule, &'static str), )*
        }

        impl Shaders {
            pub fn new(device: &wgpu::Device) -> Result<Self, Error> {
                debug!("Loading shaders");

                Ok(Self {
                    $(
                        $name: load(
                            device,
                            stringify!($name),
                            option_env!(concat!(
                                "umbra_shaders::",
                                stringify!($name),
                                ".path"
                            )),
                            option_env!(concat!(
                                "umbra_shaders::",
                                stringify!($name),
                                ".entry_point"
                            )),
                        )?,
                    )*
                })
            }
        }
    };
}

shaders!([
    accumulation_fs,
    accumulation_vs,
    composition_fs,
    composition_vs,
    denoising,
    depth_copy_fs,
    depth_copy_vs,
    downsampling,
    occlusion,
]);

fn load(
    device: &wgpu::Device,
    id: &'static str,
    path: Option<&'static str>,
    entry_point: Option<&'static str>,
) -> Result<(wgpu::ShaderModule, &'static str), Error> {
    let (Some(path), Some(entry_point)) = (path, entry_point) else {
        return Err(Error::ShaderNotCompiled { id });
    };

    debug!("Loading shader `{id}` from {path}");

    let spirv = fs::read(path)
        .map_err(|source| Error::ShaderUnreadable { id, source })?;

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("umbra_{id}")),
        source: wgpu::util::make_spirv(&spirv),
    });

    Ok((module, entry_point))
}
