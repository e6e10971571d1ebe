//! Mouse look

use std::any::Any;

use crate::core::FrameContext;
use crate::foundation::math::{utils, QuatExt};
use crate::input::{KeyCode, MouseButton};
use crate::scene::{GameComponent, TransformId};

/// Degrees per pixel of mouse travel per second at sensitivity 1
pub const ROTATE_SPEED: f32 = 100.0;

/// Seconds after a toggle during which Escape is ignored
pub const TOGGLE_DELAY: f32 = 0.15;

/// Rotates its node from mouse movement while toggled on with Escape.
///
/// Horizontal travel rolls about the forward axis, or yaws about the up axis
/// while the middle button is held. Vertical travel pitches about the right axis.
#[derive(Debug, Clone)]
pub struct FreeLook {
    transform: Option<TransformId>,
    sensitivity_x: f32,
    sensitivity_y: f32,
    active: bool,
    toggle_delay: f32,
}

impl FreeLook {
    /// Same sensitivity on both mouse axes
    pub fn new(sensitivity: f32) -> Self {
        Self::with_sensitivity(sensitivity, sensitivity)
    }

    /// Separate horizontal and vertical sensitivity
    pub fn with_sensitivity(sensitivity_x: f32, sensitivity_y: f32) -> Self {
        Self {
            transform: None,
            sensitivity_x,
            sensitivity_y,
            active: false,
            toggle_delay: 0.0,
        }
    }

    /// Whether mouse movement currently rotates the node
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl GameComponent for FreeLook {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn input(&mut self, ctx: &mut FrameContext<'_>, delta: f32) {
        if self.toggle_delay > 0.0 {
            self.toggle_delay -= delta;
            return;
        }
        if ctx.input.is_key_down(KeyCode::Escape) {
            self.active = !self.active;
            self.toggle_delay = TOGGLE_DELAY;
            log::debug!("Free look {}", if self.active { "on" } else { "off" });
            return;
        }
        if !self.active {
            return;
        }
        let Some(own) = self.transform else {
            return;
        };
        let Some(transform) = ctx.transforms.get_mut(own) else {
            return;
        };

        let speed = ROTATE_SPEED * delta;
        let mouse = ctx.input.mouse_delta();
        let (dx, dy) = (mouse.x, mouse.y);

        if dx != 0.0 {
            let yaw = ctx.input.is_mouse_down(MouseButton::Middle);
            let axis = if yaw { transform.rotation().up() } else { transform.rotation().forward() };
            transform.rotate(&axis, utils::deg_to_rad(-dx * speed * self.sensitivity_x));
        }
        if dy != 0.0 {
            let axis = transform.rotation().right();
            transform.rotate(&axis, utils::deg_to_rad(dy * speed * self.sensitivity_y));
        }
    }

    fn reset(&mut self) {
        self.active = false;
        self.toggle_delay = 0.0;
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
    use crate::foundation::math::Quat;
    use crate::foundation::time::Timer;
    use crate::input::Input;
    use crate::scene::{Transform, Transforms};

    #[test]
    fn test_escape_toggles_with_delay() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let mut input = Input::new();
        let timer = Timer::new();
        let mut look = FreeLook::new(1.0);
        look.attach(transforms.insert(Transform::default()));

        input.handle_key(KeyCode::Escape, true);
        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        look.input(&mut ctx, 0.1);
        assert!(look.is_active());

        // Still held, but inside the delay window
        look.input(&mut ctx, 0.1);
        assert!(look.is_active());
    }

    #[test]
    fn test_inactive_look_ignores_mouse() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let mut input = Input::new();
        let timer = Timer::new();
        let own = transforms.insert(Transform::default());
        let mut look = FreeLook::new(1.0);
        look.attach(own);

        input.handle_mouse_move(0.0, 0.0);
        input.handle_mouse_move(10.0, 5.0);
        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        look.input(&mut ctx, 0.1);

        assert_eq!(transforms.get(own).map(Transform::rotation), Some(Quat::identity()));
    }
}
