//! Keeps a node at a fixed offset from another node

use std::any::Any;

use crate::core::FrameContext;
use crate::foundation::math::Vec3;
use crate::scene::{GameComponent, Transform, TransformId};

/// Places its node at `target`'s world position plus a world-space offset
#[derive(Debug, Clone)]
pub struct FollowComponent {
    transform: Option<TransformId>,
    target: Option<TransformId>,
    offset: Vec3,
}

impl FollowComponent {
    /// Follow `target` at `offset`
    pub fn new(offset: Vec3, target: Option<TransformId>) -> Self {
        Self {
            transform: None,
            target,
            offset,
        }
    }

    /// Switch to another target, or stop following
    pub fn set_target(&mut self, target: Option<TransformId>) {
        self.target = target;
    }

    /// World-space offset from the target
    pub fn offset(&self) -> Vec3 {
        self.offset
    }
}

impl GameComponent for FollowComponent {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, _delta: f32) {
        let (Some(own), Some(target)) = (self.transform, self.target) else {
            return;
        };
        if !ctx.transforms.contains(target) {
            return;
        }
        let desired = ctx.transforms.transformed_position(target) + self.offset;

        // Express the world-space goal in the parent's frame
        let Some(translation) = ctx.transforms.get(own).map(Transform::translation) else {
            return;
        };
        let local = ctx.transforms.parent_space_point(own, desired);
        if local == translation {
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

    #[test]
    fn test_follows_target_with_offset() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let input = Input::new();
        let timer = Timer::new();
        let target = transforms.insert(Transform::from_translation(Vec3::new(3.0, 4.0, 0.0)));
        let own = transforms.insert(Transform::default());
        let mut follow = FollowComponent::new(Vec3::new(0.0, -0.5, 10.0), Some(target));
        follow.attach(own);

        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        follow.update(&mut ctx, 0.016);

        assert_relative_eq!(transforms.transformed_position(own), Vec3::new(3.0, 3.5, 10.0));
    }

    #[test]
    fn test_offset_is_world_space_under_a_parent() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let input = Input::new();
        let timer = Timer::new();
        let target = transforms.insert(Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let parent = transforms.insert(Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)));
        let own = transforms.insert(Transform::default());
        transforms.set_parent(own, Some(parent)).unwrap();
        let mut follow = FollowComponent::new(Vec3::new(0.0, 0.0, 2.0), Some(target));
        follow.attach(own);

        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        follow.update(&mut ctx, 0.016);

        assert_relative_eq!(transforms.transformed_position(own), Vec3::new(1.0, 0.0, 2.0), epsilon = 1.0e-5);
    }

    #[test]
    fn test_still_target_leaves_children_cached() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let input = Input::new();
        let timer = Timer::new();
        let target = transforms.insert(Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)));
        let own = transforms.insert(Transform::default());
        let child = transforms.insert(Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        transforms.set_parent(child, Some(own)).unwrap();
        let mut follow = FollowComponent::new(Vec3::new(0.0, 0.0, 4.0), Some(target));
        follow.attach(own);

        let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
        follow.update(&mut ctx, 0.016);
        let placed = transforms.get_transformation(child);
        let refreshes = transforms.cache_refreshes();

        for _ in 0..3 {
            let mut ctx = FrameContext::new(&input, &timer, &mut globals, &mut transforms);
            follow.update(&mut ctx, 0.016);
            assert_eq!(transforms.get_transformation(child), placed);
        }
        assert_eq!(transforms.cache_refreshes(), refreshes);
    }
}
