//! Turns a node towards another node

use std::any::Any;

use crate::core::FrameContext;
use crate::foundation::math::{Quat, QuatExt, Vec3};
use crate::scene::{GameComponent, TransformId};

/// Turn rate factor; the node covers `delta * TURN_RATE` of the remaining angle per tick
pub const TURN_RATE: f32 = 5.0;

/// Smoothly rotates its node to face a target node
#[derive(Debug, Clone)]
pub struct LookAtComponent {
    transform: Option<TransformId>,
    target: Option<TransformId>,
    up: Vec3,
}

impl LookAtComponent {
    /// Face `target` with +Y as the reference up axis
    pub fn new(target: Option<TransformId>) -> Self {
        Self {
            transform: None,
            target,
            up: Vec3::y(),
        }
    }

    /// Use another reference up axis
    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// Switch to another target, or stop turning
    pub fn set_target(&mut self, target: Option<TransformId>) {
        self.target = target;
    }
}

impl GameComponent for LookAtComponent {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, delta: f32) {
        let (Some(own), Some(target)) = (self.transform, self.target) else {
            return;
        };
        if !ctx.transforms.contains(target) {
            return;
        }
        let forward = ctx.transforms.transformed_position(target) - ctx.transforms.transformed_position(own);
        let Some(goal) = Quat::look_rotation(&forward, &self.up) else {
            return;
        };
        let t = (delta * TURN_RATE).clamp(0.0, 1.0);
        if let Some(transform) = ctx.transforms.get_mut(own) {
            let rotation = transform.rotation().slerp_to(&goal, t);
            transform.set_rotation(rotation);
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
    fn test_full_step_faces_target() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let input = Input::new();
        let timer = Timer::new();
        let target = transforms.insert(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        let own = transforms.insert(Transform::default());
        let mut look = LookAtComponent::new(Some(target));
        look.attach(own);

        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        look.update(&mut ctx, 1.0);

        let forward = transforms.transformed_rotation(own).forward();
        assert_relative_eq!(forward, Vec3::x(), epsilon = 1.0e-5);
    }

    #[test]
    fn test_coincident_target_keeps_rotation() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let input = Input::new();
        let timer = Timer::new();
        let target = transforms.insert(Transform::default());
        let own = transforms.insert(Transform::default());
        let mut look = LookAtComponent::new(Some(target));
        look.attach(own);

        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        look.update(&mut ctx, 0.1);

        assert_eq!(transforms.get(own).map(Transform::rotation), Some(Quat::identity()));
    }
}
