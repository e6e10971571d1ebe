//! Camera component
//!
//! Publishes its node as the scene's [`MainCamera`] when added to the
//! rendering engine. The projection follows window resizes.

use std::any::Any;

use crate::core::{FrameContext, RendererConfig, SharedGlobals};
use crate::render::{MainCamera, Projection};
use crate::scene::{GameComponent, TransformId, Transforms};

/// Perspective camera attached to a node
#[derive(Debug, Clone)]
pub struct Camera {
    transform: Option<TransformId>,
    projection: Projection,
}

impl Camera {
    /// Camera with an explicit projection
    pub fn new(projection: Projection) -> Self {
        Self {
            transform: None,
            projection,
        }
    }

    /// Camera with the configured field of view and clip planes
    pub fn from_config(config: &RendererConfig, aspect: f32) -> Self {
        Self::new(Projection::perspective(config.fov_degrees, aspect, config.z_near, config.z_far))
    }

    /// Current projection
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    fn is_main(&self, globals: &SharedGlobals) -> bool {
        match (self.transform, globals.main_camera()) {
            (Some(own), Some(main)) => main.transform == own,
            _ => false,
        }
    }
}

impl GameComponent for Camera {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, _delta: f32) {
        if !ctx.globals.was_resized() {
            return;
        }
        self.projection = self.projection.with_aspect(ctx.globals.aspect_ratio());
        if self.is_main(ctx.globals) {
            if let Some(main) = ctx.globals.main_camera_mut() {
                main.projection = Some(self.projection);
            }
        }
        log::debug!("Camera aspect set to {:.3}", self.projection.aspect);
    }

    fn add_to_rendering_engine(&mut self, globals: &mut SharedGlobals, _transforms: &mut Transforms) {
        let Some(transform) = self.transform else {
            log::warn!("Detached camera cannot become the main camera");
            return;
        };
        globals.set_main_camera(Some(MainCamera {
            transform,
            projection: Some(self.projection),
        }));
    }

    fn remove_from_rendering_engine(&mut self, globals: &mut SharedGlobals) {
        if self.is_main(globals) {
            globals.set_main_camera(None);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::time::Timer;
    use crate::input::Input;
    use crate::scene::Transform;

    #[test]
    fn test_publishes_and_withdraws_main_camera() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let id = transforms.insert(Transform::default());
        let mut camera = Camera::from_config(&RendererConfig::default(), 16.0 / 9.0);
        camera.attach(id);

        camera.add_to_rendering_engine(&mut globals, &mut transforms);
        let main = globals.main_camera().copied().unwrap();
        assert_eq!(main.transform, id);
        assert_eq!(main.projection, Some(*camera.projection()));

        camera.remove_from_rendering_engine(&mut globals);
        assert!(globals.main_camera().is_none());
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let input = Input::new();
        let timer = Timer::new();
        let id = transforms.insert(Transform::default());
        let mut camera = Camera::from_config(&RendererConfig::default(), 1.0);
        camera.attach(id);
        camera.add_to_rendering_engine(&mut globals, &mut transforms);

        globals.set_window_size(800, 400);
        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        camera.update(&mut ctx, 0.016);

        assert_eq!(camera.projection().aspect, 2.0);
        assert_eq!(globals.main_camera().and_then(|c| c.projection).map(|p| p.aspect), Some(2.0));
    }
}
