//! Orbit camera

use std::any::Any;

use crate::core::FrameContext;
use crate::foundation::math::{utils, QuatExt, Vec2, Vec3};
use crate::input::MouseButton;
use crate::scene::{GameComponent, Transform, TransformId};

/// Drags shorter than this on the virtual sphere are ignored
pub const MIN_DRAG: f32 = 1.0e-2;

/// Radius change per scroll notch
pub const ZOOM_STEP: f32 = 0.5;

/// Closest the orbit may get to its target
pub const MIN_RADIUS: f32 = 0.1;

/// Keeps its node on a sphere around a target and turns it with right-button drags.
///
/// The cursor is projected onto a virtual sphere spanning the window; the
/// rotation between the previous and current projection is applied to the node.
/// Scrolling shrinks or grows the sphere.
#[derive(Debug, Clone)]
pub struct ArcBall {
    transform: Option<TransformId>,
    target: Option<TransformId>,
    radius: f32,
}

impl ArcBall {
    /// Orbit `target` at `radius`
    pub fn new(radius: f32, target: Option<TransformId>) -> Self {
        Self {
            transform: None,
            target,
            radius: radius.max(MIN_RADIUS),
        }
    }

    /// Current orbit radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Switch target, or stop orbiting
    pub fn set_target(&mut self, target: Option<TransformId>) {
        self.target = target;
    }

    /// Cursor position mapped onto the sphere; points outside the disc stay on
    /// its equator
    fn project(&self, cursor: Vec2, window: (u32, u32)) -> Vec3 {
        #[allow(clippy::cast_precision_loss)]
        let half = Vec2::new(window.0.max(1) as f32, window.1.max(1) as f32) / 2.0;
        let x = (cursor.x - half.x) / half.x * self.radius;
        let z = (cursor.y - half.y) / half.y * self.radius;
        let planar = x * x + z * z;
        let squared = self.radius * self.radius;
        let y = if planar <= squared { (squared - planar).sqrt() } else { 0.0 };
        Vec3::new(x, y, z)
    }
}

impl GameComponent for ArcBall {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn input(&mut self, ctx: &mut FrameContext<'_>, _delta: f32) {
        let Some(own) = self.transform else {
            return;
        };
        if self.target.is_none() {
            return;
        }

        let scroll = ctx.input.scroll_delta().y;
        if scroll != 0.0 {
            self.radius = (self.radius - scroll * ZOOM_STEP).max(MIN_RADIUS);
        }

        if !ctx.input.is_mouse_down(MouseButton::Right) {
            return;
        }
        let window = ctx.globals.window_size();
        let current = ctx.input.mouse_position();
        let from = self.project(current - ctx.input.mouse_delta(), window);
        let to = self.project(current, window);
        if (to - from).norm() < MIN_DRAG {
            return;
        }

        let (from, to) = (utils::safe_normalize(&from), utils::safe_normalize(&to));
        let axis = from.cross(&to);
        if axis.norm() <= f32::EPSILON {
            return;
        }
        let angle = from.dot(&to).clamp(-1.0, 1.0).acos();
        if let Some(transform) = ctx.transforms.get_mut(own) {
            transform.rotate(&axis, angle);
        }
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, _delta: f32) {
        let (Some(own), Some(target)) = (self.transform, self.target) else {
            return;
        };
        if !ctx.transforms.contains(target) || !ctx.transforms.contains(own) {
            return;
        }

        let center = ctx.transforms.transformed_position(target);
        let position = ctx.transforms.transformed_position(own);
        let mut direction = utils::safe_normalize(&(position - center));
        if direction == Vec3::zeros() {
            direction = ctx.transforms.transformed_rotation(own).back();
        }

        let local = ctx.transforms.parent_space_point(own, center + direction * self.radius);
        if ctx.transforms.get(own).map(Transform::translation) == Some(local) {
            return;
        }
        if let Some(transform) = ctx.transforms.get_mut(own) {
            transform.set_translation(local);
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
    use crate::scene::Transforms;
    use approx::assert_relative_eq;

    struct Rig {
        transforms: Transforms,
        globals: SharedGlobals,
        input: Input,
        timer: Timer,
        own: TransformId,
        target: TransformId,
    }

    fn rig(own_at: Vec3, target_at: Vec3) -> Rig {
        let mut transforms = Transforms::new();
        let own = transforms.insert(Transform::from_translation(own_at));
        let target = transforms.insert(Transform::from_translation(target_at));
        let mut globals = SharedGlobals::new();
        globals.set_window_size(200, 100);
        Rig {
            transforms,
            globals,
            input: Input::new(),
            timer: Timer::new(),
            own,
            target,
        }
    }

    impl Rig {
        fn tick(&mut self, arc_ball: &mut ArcBall) {
            let mut ctx = FrameContext::new(&self.input, &self.timer, &mut self.globals, &mut self.transforms);
            arc_ball.input(&mut ctx, 0.016);
            arc_ball.update(&mut ctx, 0.016);
            self.input.end_frame();
        }
    }

    #[test]
    fn test_snaps_onto_the_orbit_sphere() {
        let mut rig = rig(Vec3::new(0.0, 0.0, -10.0), Vec3::new(1.0, 0.0, 0.0));
        let mut arc_ball = ArcBall::new(4.0, Some(rig.target));
        arc_ball.attach(rig.own);

        rig.tick(&mut arc_ball);

        let position = rig.transforms.transformed_position(rig.own);
        assert_relative_eq!((position - Vec3::new(1.0, 0.0, 0.0)).norm(), 4.0, epsilon = 1.0e-5);
        assert!(position.z < 0.0);
    }

    #[test]
    fn test_scroll_zooms_within_limits() {
        let mut rig = rig(Vec3::new(0.0, 0.0, -5.0), Vec3::zeros());
        let mut arc_ball = ArcBall::new(2.0, Some(rig.target));
        arc_ball.attach(rig.own);

        rig.input.handle_scroll(0.0, 2.0);
        rig.tick(&mut arc_ball);
        assert_relative_eq!(arc_ball.radius(), 1.0);

        rig.input.handle_scroll(0.0, 10.0);
        rig.tick(&mut arc_ball);
        assert_relative_eq!(arc_ball.radius(), MIN_RADIUS);
    }

    #[test]
    fn test_drag_rotates_only_while_right_button_held() {
        let mut rig = rig(Vec3::new(0.0, 0.0, -5.0), Vec3::zeros());
        let mut arc_ball = ArcBall::new(5.0, Some(rig.target));
        arc_ball.attach(rig.own);

        rig.input.handle_mouse_move(100.0, 50.0);
        rig.tick(&mut arc_ball);
        rig.input.handle_mouse_move(140.0, 50.0);
        rig.tick(&mut arc_ball);
        assert_eq!(rig.transforms.get(rig.own).unwrap().rotation(), crate::foundation::math::Quat::identity());

        rig.input.handle_mouse_button(MouseButton::Right, true);
        rig.input.handle_mouse_move(180.0, 50.0);
        rig.tick(&mut arc_ball);
        let rotation = rig.transforms.get(rig.own).unwrap().rotation();
        assert!(rotation.angle() > 0.1);
        assert_relative_eq!(rotation.axis().unwrap().into_inner().z.abs(), 1.0, epsilon = 1.0e-4);
    }

    #[test]
    fn test_without_target_the_node_stays_put() {
        let mut rig = rig(Vec3::new(3.0, 0.0, 0.0), Vec3::zeros());
        let mut arc_ball = ArcBall::new(1.0, None);
        arc_ball.attach(rig.own);

        rig.tick(&mut arc_ball);
        assert_eq!(rig.transforms.get(rig.own).unwrap().translation(), Vec3::new(3.0, 0.0, 0.0));
    }
}
