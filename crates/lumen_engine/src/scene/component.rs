//! Component trait
//!
//! Components are units of behaviour owned by a [`GameObject`](super::GameObject).
//! Every hook has a no-op default so a component only implements the phases
//! it takes part in.

use std::any::Any;

use crate::core::{FrameContext, SharedGlobals};
use crate::render::{RenderError, RenderPass};
use crate::scene::{TransformId, Transforms};

/// Behaviour attached to a scene node
pub trait GameComponent: Any {
    /// Called by the owning node when the component is added to it
    fn attach(&mut self, transform: TransformId);

    /// Node transform this component was attached to
    fn transform(&self) -> Option<TransformId>;

    /// Input phase; transforms were snapshotted just before
    fn input(&mut self, _ctx: &mut FrameContext<'_>, _delta: f32) {}

    /// Update phase
    fn update(&mut self, _ctx: &mut FrameContext<'_>, _delta: f32) {}

    /// Draw into the current pass
    fn render(&self, _pass: &mut RenderPass<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    /// Return to the initial state
    fn reset(&mut self) {}

    /// Publish renderer-facing state (lights, camera) into the registry.
    ///
    /// May be called more than once; implementations register at most once.
    fn add_to_rendering_engine(&mut self, _globals: &mut SharedGlobals, _transforms: &mut Transforms) {}

    /// Withdraw anything published by [`GameComponent::add_to_rendering_engine`]
    fn remove_from_rendering_engine(&mut self, _globals: &mut SharedGlobals) {}

    /// Downcast to concrete component type
    fn as_any(&self) -> &dyn Any;

    /// Downcast to mutable concrete component type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
