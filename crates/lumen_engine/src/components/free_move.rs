//! Keyboard fly-through movement

use std::any::Any;

use crate::core::FrameContext;
use crate::foundation::math::{QuatExt, Vec3};
use crate::input::KeyCode;
use crate::scene::{GameComponent, Transform, TransformId};

/// Units per second at sensitivity 1
pub const MOVE_SPEED: f32 = 10.0;

/// Moves its node along its own axes while keys are held.
///
/// W/S move along forward, A/D along left and right, Q/E up and down.
#[derive(Debug, Clone)]
pub struct FreeMove {
    transform: Option<TransformId>,
    sensitivity: Vec3,
}

impl FreeMove {
    /// Same sensitivity on every axis
    pub fn new(sensitivity: f32) -> Self {
        Self::with_sensitivity(Vec3::repeat(sensitivity))
    }

    /// Forward, lateral and vertical sensitivities
    pub fn with_sensitivity(sensitivity: Vec3) -> Self {
        Self {
            transform: None,
            sensitivity,
        }
    }
}

impl GameComponent for FreeMove {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn input(&mut self, ctx: &mut FrameContext<'_>, delta: f32) {
        let Some(own) = self.transform else {
            return;
        };
        let input = ctx.input;
        let Some(rotation) = ctx.transforms.get(own).map(Transform::rotation) else {
            return;
        };

        let step = MOVE_SPEED * delta;
        let bindings = [
            (KeyCode::W, rotation.forward(), self.sensitivity.x),
            (KeyCode::S, rotation.back(), self.sensitivity.x),
            (KeyCode::A, rotation.left(), self.sensitivity.y),
            (KeyCode::D, rotation.right(), self.sensitivity.y),
            (KeyCode::Q, rotation.up(), self.sensitivity.z),
            (KeyCode::E, rotation.down(), self.sensitivity.z),
        ];

        let mut offset = Vec3::zeros();
        for (key, direction, sensitivity) in bindings {
            if input.is_key_down(key) {
                offset += direction * step * sensitivity;
            }
        }
        if offset == Vec3::zeros() {
            return;
        }
        if let Some(transform) = ctx.transforms.get_mut(own) {
            transform.set_translation(transform.translation() + offset);
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
    use crate::core::SharedGlobals;
    use crate::foundation::time::Timer;
    use crate::input::Input;
    use crate::scene::{Transform, Transforms};
    use approx::assert_relative_eq;

    #[test]
    fn test_held_keys_move_along_local_axes() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let mut input = Input::new();
        let timer = Timer::new();
        let own = transforms.insert(Transform::default());
        let mut free_move = FreeMove::with_sensitivity(Vec3::new(1.0, 2.0, 1.0));
        free_move.attach(own);

        input.handle_key(KeyCode::W, true);
        input.handle_key(KeyCode::D, true);
        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        free_move.input(&mut ctx, 0.5);

        assert_relative_eq!(transforms.transformed_position(own), Vec3::new(10.0, 0.0, 5.0));
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let mut input = Input::new();
        let timer = Timer::new();
        let own = transforms.insert(Transform::default());
        let mut free_move = FreeMove::new(1.0);
        free_move.attach(own);

        input.handle_key(KeyCode::Q, true);
        input.handle_key(KeyCode::E, true);
        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        free_move.input(&mut ctx, 1.0);

        assert_relative_eq!(transforms.transformed_position(own), Vec3::zeros());
    }

    #[test]
    fn test_idle_keys_leave_children_cached() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let input = Input::new();
        let timer = Timer::new();
        let own = transforms.insert(Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let child = transforms.insert(Transform::default());
        transforms.set_parent(child, Some(own)).unwrap();
        let mut free_move = FreeMove::new(1.0);
        free_move.attach(own);

        let placed = transforms.get_transformation(child);
        let refreshes = transforms.cache_refreshes();
        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        free_move.input(&mut ctx, 1.0);

        assert_eq!(transforms.get_transformation(child), placed);
        assert_eq!(transforms.cache_refreshes(), refreshes);
    }
}
