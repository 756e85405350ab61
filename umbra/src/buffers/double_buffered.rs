use glam::UVec2;

use crate::{Bindable, DoubleBufferedBindable, Texture};

/// Ping-pong pair, e.g. the two occlusion buffers.
///
/// Bind groups built from a pair come in two flavours: the regular one sees
/// the pair through [`Self::forward()`] and the alternate one through
/// [`Self::backward()`]. A stage reading `forward()` and writing `backward()`
/// thus reads `a` and writes `b` in the regular flavour, and the other way
/// around in the alternate one.
#[derive(Debug)]
pub struct DoubleBuffered<T> {
    a: T,
    b: T,
}

impl DoubleBuffered<Texture> {
    /// Creates a double-buffered texture.
    ///
    /// See: [`Texture::new()`].
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: UVec2,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let label = label.as_ref();

        Self::from_pair(
            Texture::new(device, format!("{label}_a"), size, format, usage),
            Texture::new(device, format!("{label}_b"), size, format, usage),
        )
    }
}

impl DoubleBuffered<&Texture> {
    /// See: [`Texture::bind_sampled()`].
    pub fn bind_sampled(&self) -> impl DoubleBufferedBindable + '_ {
        DoubleBufferedBinder {
            a: self.a.bind_sampled(),
            b: self.b.bind_sampled(),
        }
    }

    /// See: [`Texture::bind_writable()`].
    pub fn bind_writable(&self) -> impl DoubleBufferedBindable + '_ {
        DoubleBufferedBinder {
            a: self.a.bind_writable(),
            b: self.b.bind_writable(),
        }
    }
}

impl<T> DoubleBuffered<T> {
    pub fn from_pair(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Returns the half given flavour of bind group sees first.
    pub fn get(&self, alternate: bool) -> &T {
        if alternate {
            &self.b
        } else {
            &self.a
        }
    }

    /// `a` in the regular flavour, `b` in the alternate one.
    pub fn forward(&self) -> DoubleBuffered<&T> {
        DoubleBuffered {
            a: &self.a,
            b: &self.b,
        }
    }

    /// `b` in the regular flavour, `a` in the alternate one.
    pub fn backward(&self) -> DoubleBuffered<&T> {
        DoubleBuffered {
            a: &self.b,
            b: &self.a,
        }
    }
}

pub struct DoubleBufferedBinder<T> {
    a: T,
    b: T,
}

impl<T> DoubleBufferedBindable for DoubleBufferedBinder<T>
where
    T: Bindable,
{
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, [wgpu::BindingResource; 2])> {
        let entries_a = self.a.bind(binding);
        let entries_b = self.b.bind(binding);

        assert_eq!(entries_a.len(), entries_b.len());

        entries_a
            .into_iter()
            .zip(entries_b)
            .map(|((layout_a, resource_a), (layout_b, resource_b))| {
                assert_eq!(layout_a, layout_b);

                (layout_a, [resource_a, resource_b])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavours() {
        let pair = DoubleBuffered::from_pair("a", "b");

        assert_eq!(&"a", pair.get(false));
        assert_eq!(&"b", pair.get(true));

        assert_eq!(&&"a", pair.forward().get(false));
        assert_eq!(&&"b", pair.forward().get(true));
        assert_eq!(&&"b", pair.backward().get(false));
        assert_eq!(&&"a", pair.backward().get(true));
    }
}
