//! Scene graph
//!
//! A [`Scene`] is a transform arena plus a root [`GameObject`]. Nodes own their
//! components and children; transforms live in the arena and refer to their
//! parent by [`TransformId`], so no node ever owns its parent.
//!
//! ```text
//! Scene
//!  ├── Transforms (arena)
//!  └── root: GameObject
//!        ├── components
//!        └── children: GameObject ...
//! ```

mod component;
mod game_object;
mod transform;

use thiserror::Error;

pub use component::GameComponent;
pub use game_object::{GameObject, Teardown};
pub use transform::{Transform, TransformId, Transforms};

use crate::core::{FrameContext, SharedGlobals};
use crate::foundation::time::Timer;
use crate::input::Input;

/// Scene graph errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// Handle does not refer to a live transform
    #[error("Unknown transform handle")]
    UnknownTransform,

    /// Re-parenting would make a transform its own ancestor
    #[error("Re-parenting would create a cycle")]
    ParentCycle,
}

/// Transform arena plus the root node
#[derive(Debug)]
pub struct Scene {
    transforms: Transforms,
    root: GameObject,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with an identity root
    pub fn new() -> Self {
        let mut transforms = Transforms::new();
        let root = GameObject::new(&mut transforms);
        Self { transforms, root }
    }

    /// Root node
    pub fn root(&self) -> &GameObject {
        &self.root
    }

    /// Mutable root node
    pub fn root_mut(&mut self) -> &mut GameObject {
        &mut self.root
    }

    /// Transform arena
    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    /// Mutable transform arena
    pub fn transforms_mut(&mut self) -> &mut Transforms {
        &mut self.transforms
    }

    /// Root and arena borrowed together
    pub fn parts_mut(&mut self) -> (&mut GameObject, &mut Transforms) {
        (&mut self.root, &mut self.transforms)
    }

    /// Detached node whose transform lives in this scene's arena
    pub fn create_object(&mut self, transform: Transform) -> GameObject {
        GameObject::with_transform(&mut self.transforms, transform)
    }

    /// Attach `object` under the root and publish its renderer-facing state
    pub fn add_object(&mut self, mut object: GameObject, globals: &mut SharedGlobals) -> TransformId {
        let id = object.transform();
        object.add_to_rendering_engine(globals, &mut self.transforms);
        self.root.add_child(&mut self.transforms, object);
        id
    }

    /// Detach and tear down the root's child owning `transform`
    pub fn despawn_object(&mut self, transform: TransformId, globals: &mut SharedGlobals) -> Option<Teardown> {
        let index = self
            .root
            .children()
            .iter()
            .position(|child| child.transform() == transform)?;
        let child = self.root.detach_child(&mut self.transforms, index)?;
        Some(child.despawn(&mut self.transforms, globals))
    }

    /// Input phase over the whole graph
    pub fn input(&mut self, input: &Input, timer: &Timer, globals: &mut SharedGlobals, delta: f32) {
        let mut ctx = FrameContext::new(input, timer, globals, &mut self.transforms);
        self.root.input(&mut ctx, delta);
    }

    /// Update phase over the whole graph
    pub fn update(&mut self, input: &Input, timer: &Timer, globals: &mut SharedGlobals, delta: f32) {
        let mut ctx = FrameContext::new(input, timer, globals, &mut self.transforms);
        self.root.update(&mut ctx, delta);
    }

    /// Reset every component
    pub fn reset(&mut self) {
        self.root.reset();
    }

    /// Publish the whole graph's renderer-facing state
    pub fn add_to_rendering_engine(&mut self, globals: &mut SharedGlobals) {
        self.root.add_to_rendering_engine(globals, &mut self.transforms);
    }

    /// Tear the whole graph down, leaving an empty scene behind
    pub fn teardown(&mut self, globals: &mut SharedGlobals) -> Teardown {
        let fresh = GameObject::new(&mut self.transforms);
        let old = std::mem::replace(&mut self.root, fresh);
        let teardown = old.despawn(&mut self.transforms, globals);
        log::info!(
            "Scene torn down: {} objects, {} components released",
            teardown.objects,
            teardown.components
        );
        teardown
    }
}
