use std::ops::{Deref, DerefMut};

use crate::Camera;

/// Collaborator providing what's being rendered.
///
/// Umbra doesn't know how to draw objects; it only tells the scene which
/// objects to draw and where.
pub trait Scene {
    type Object: Clone;

    fn camera(&self) -> Camera;

    /// Returns the objects to draw, classified by how they interact with
    /// occlusion (see [`ScenePartition::classify()`]).
    fn partition(&self) -> ScenePartition<Self::Object>;

    fn fog(&self) -> Option<Fog> {
        None
    }

    fn render_state(&self) -> RenderState;

    fn set_render_state(&mut self, state: RenderState);

    /// Draws given objects into given target.
    ///
    /// When `target.load` is set, the target's existing contents (color and
    /// depth) must be preserved instead of cleared.
    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        target: SceneTarget<'_>,
        objects: &[Self::Object],
    );
}

/// Where [`Scene::render()`] draws to.
#[derive(Clone, Copy, Debug)]
pub struct SceneTarget<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    pub load: bool,
}

/// Parts of the scene's state overridden when rendering transparency targets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderState {
    /// Whether the scene draws its background (skybox, environment etc.)
    pub background: bool,
    pub clear_color: wgpu::Color,
}

/// Overrides scene's render state, restoring the original one when dropped.
pub struct RenderStateGuard<'a, S>
where
    S: Scene,
{
    scene: &'a mut S,
    saved: RenderState,
}

impl<'a, S> RenderStateGuard<'a, S>
where
    S: Scene,
{
    pub fn new(scene: &'a mut S, state: RenderState) -> Self {
        let saved = scene.render_state();

        scene.set_render_state(state);

        Self { scene, saved }
    }

    /// Overrides state so that only the objects themselves get drawn, over
    /// a transparent background.
    pub fn transparent(scene: &'a mut S) -> Self {
        Self::new(
            scene,
            RenderState {
                background: false,
                clear_color: wgpu::Color::TRANSPARENT,
            },
        )
    }
}

impl<S> Deref for RenderStateGuard<'_, S>
where
    S: Scene,
{
    type Target = S;

    fn deref(&self) -> &Self::Target {
        self.scene
    }
}

impl<S> DerefMut for RenderStateGuard<'_, S>
where
    S: Scene,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.scene
    }
}

impl<S> Drop for RenderStateGuard<'_, S>
where
    S: Scene,
{
    fn drop(&mut self) {
        self.scene.set_render_state(self.saved);
    }
}

/// Material properties deciding how an object gets classified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterialTraits {
    pub visible: bool,
    pub transparent: bool,
    pub depth_write: bool,

    /// Transparent object that should be occluded as if it were opaque
    pub treat_as_opaque: bool,

    /// Object that occlusion must not be drawn over
    pub cannot_receive_ao: bool,
}

/// Scene's objects, split into three disjoint lists.
#[derive(Clone, Debug)]
pub struct ScenePartition<O> {
    pub opaque: Vec<O>,
    pub transparent_depth_write: Vec<O>,
    pub transparent_no_depth_write: Vec<O>,
}

impl<O> Default for ScenePartition<O> {
    fn default() -> Self {
        Self {
            opaque: Default::default(),
            transparent_depth_write: Default::default(),
            transparent_no_depth_write: Default::default(),
        }
    }
}

impl<O> ScenePartition<O> {
    pub fn classify(
        objects: impl IntoIterator<Item = (O, MaterialTraits)>,
    ) -> Self {
        let mut this = Self::default();

        for (object, traits) in objects {
            if !traits.visible {
                continue;
            }

            let list = if traits.cannot_receive_ao {
                &mut this.transparent_no_depth_write
            } else if traits.treat_as_opaque || !traits.transparent {
                &mut this.opaque
            } else if traits.depth_write {
                &mut this.transparent_depth_write
            } else {
                &mut this.transparent_no_depth_write
            };

            list.push(object);
        }

        this
    }

    pub fn has_transparency(&self) -> bool {
        !self.transparent_depth_write.is_empty()
            || !self.transparent_no_depth_write.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &O> {
        self.opaque
            .iter()
            .chain(&self.transparent_depth_write)
            .chain(&self.transparent_no_depth_write)
    }
}

/// Fog applied by the scene; occlusion fades out the same way.
#[derive(Clone, Debug, PartialEq)]
pub enum Fog {
    Linear { near: f32, far: f32 },
    ExponentialSquared { density: f32 },

    /// Fog model we don't know how to replicate; occlusion is drawn as if
    /// there was no fog
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits(f: impl FnOnce(&mut MaterialTraits)) -> MaterialTraits {
        let mut traits = MaterialTraits {
            visible: true,
            ..Default::default()
        };

        f(&mut traits);
        traits
    }

    #[test]
    fn classify() {
        let objects = [
            ("opaque", traits(|_| ())),
            ("hidden", traits(|t| t.visible = false)),
            (
                "glass",
                traits(|t| {
                    t.transparent = true;
                    t.depth_write = true;
                }),
            ),
            ("smoke", traits(|t| t.transparent = true)),
            (
                "leaves",
                traits(|t| {
                    t.transparent = true;
                    t.treat_as_opaque = true;
                }),
            ),
            (
                "hud",
                traits(|t| {
                    t.treat_as_opaque = true;
                    t.cannot_receive_ao = true;
                }),
            ),
        ];

        let partition = ScenePartition::classify(objects);

        assert_eq!(vec!["opaque", "leaves"], partition.opaque);
        assert_eq!(vec!["glass"], partition.transparent_depth_write);
        assert_eq!(vec!["smoke", "hud"], partition.transparent_no_depth_write);
        assert!(partition.has_transparency());
        assert_eq!(5, partition.iter().count());

        let partition = ScenePartition::classify([("opaque", traits(|_| ()))]);

        assert!(!partition.has_transparency());
    }

    struct TestScene {
        state: RenderState,
    }

    impl Scene for TestScene {
        type Object = ();

        fn camera(&self) -> Camera {
            Camera::perspective(
                Default::default(),
                1.0,
                1.0,
                0.1,
                100.0,
                Default::default(),
            )
        }

        fn partition(&self) -> ScenePartition<()> {
            Default::default()
        }

        fn render_state(&self) -> RenderState {
            self.state
        }

        fn set_render_state(&mut self, state: RenderState) {
            self.state = state;
        }

        fn render(
            &mut self,
            _: &mut wgpu::CommandEncoder,
            _: SceneTarget<'_>,
            _: &[()],
        ) {
            unreachable!()
        }
    }

    #[test]
    fn render_state_guard() {
        let original = RenderState {
            background: true,
            clear_color: wgpu::Color::BLUE,
        };

        let mut scene = TestScene { state: original };

        {
            let guard = RenderStateGuard::transparent(&mut scene);

            assert!(!guard.render_state().background);
            assert_eq!(wgpu::Color::TRANSPARENT, guard.render_state().clear_color);
        }

        assert_eq!(original, scene.state);
    }
}
