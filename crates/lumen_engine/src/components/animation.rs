//! Keyframe animation
//!
//! A [`Track`] is a list of poses over time. [`AnimationComponent`] samples it
//! every update and writes the pose into its node's local transform:
//! translation and scale are interpolated linearly, rotation spherically.

use std::any::Any;

use thiserror::Error;

use crate::core::FrameContext;
use crate::foundation::math::{Quat, QuatExt, Vec3};
use crate::scene::{GameComponent, TransformId};

/// Errors building a [`Track`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A track needs at least one keyframe
    #[error("Animation track has no keyframes")]
    Empty,

    /// Keyframe times must be finite, non-negative and strictly increasing
    #[error("Keyframe {index} at {time}s is out of order")]
    OutOfOrder {
        /// Offending keyframe
        index: usize,
        /// Its time
        time: f32,
    },
}

/// Local pose at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Seconds from the start of the track
    pub time: f32,
    /// Local translation
    pub translation: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// Local scale
    pub scale: Vec3,
}

impl Keyframe {
    /// Pose with unit scale and no rotation
    pub fn at(time: f32, translation: Vec3) -> Self {
        Self {
            time,
            translation,
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }

    /// Builder-style rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder-style scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    fn blend(&self, next: &Self, t: f32) -> Self {
        Self {
            time: self.time + (next.time - self.time) * t,
            translation: self.translation.lerp(&next.translation, t),
            rotation: self.rotation.slerp_to(&next.rotation, t),
            scale: self.scale.lerp(&next.scale, t),
        }
    }
}

/// Validated, time-ordered keyframes
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    keys: Vec<Keyframe>,
}

impl Track {
    /// Build a track from keyframes in time order
    pub fn new(keys: Vec<Keyframe>) -> Result<Self, AnimationError> {
        if keys.is_empty() {
            return Err(AnimationError::Empty);
        }
        let mut previous = None;
        for (index, key) in keys.iter().enumerate() {
            let ordered = key.time.is_finite() && key.time >= 0.0 && previous.map_or(true, |p| key.time > p);
            if !ordered {
                return Err(AnimationError::OutOfOrder { index, time: key.time });
            }
            previous = Some(key.time);
        }
        Ok(Self { keys })
    }

    /// Time of the last keyframe
    pub fn duration(&self) -> f32 {
        self.keys.last().map_or(0.0, |key| key.time)
    }

    /// Keyframes in time order
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Pose at `time`, holding the first and last keyframes outside the track
    pub fn sample(&self, time: f32) -> Keyframe {
        let next = self.keys.partition_point(|key| key.time <= time);
        match (next.checked_sub(1).and_then(|i| self.keys.get(i)), self.keys.get(next)) {
            (Some(before), Some(after)) => {
                let t = (time - before.time) / (after.time - before.time);
                before.blend(after, t)
            }
            (Some(only), None) | (None, Some(only)) => Keyframe { time, ..*only },
            (None, None) => Keyframe::at(time, Vec3::zeros()),
        }
    }
}

/// What happens when playback reaches the end of the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Playback {
    /// Wrap around to the start
    #[default]
    Loop,
    /// Hold the last pose and stop
    Once,
}

/// Plays a [`Track`] on its node
#[derive(Debug, Clone)]
pub struct AnimationComponent {
    transform: Option<TransformId>,
    track: Track,
    playback: Playback,
    speed: f32,
    time: f32,
    playing: bool,
}

impl AnimationComponent {
    /// Looping playback at normal speed, started
    pub fn new(track: Track) -> Self {
        Self {
            transform: None,
            track,
            playback: Playback::Loop,
            speed: 1.0,
            time: 0.0,
            playing: true,
        }
    }

    /// Builder-style playback mode
    pub fn with_playback(mut self, playback: Playback) -> Self {
        self.playback = playback;
        self
    }

    /// Builder-style playback rate; negative plays backwards
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Resume playback
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Freeze at the current time
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Jump to `time`, wrapped or clamped by the playback mode
    pub fn seek(&mut self, time: f32) {
        self.time = self.normalized(time);
    }

    /// Current position in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Whether updates advance the clock
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The track being played
    pub fn track(&self) -> &Track {
        &self.track
    }

    fn normalized(&self, time: f32) -> f32 {
        let duration = self.track.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        match self.playback {
            Playback::Loop => time.rem_euclid(duration),
            Playback::Once => time.clamp(0.0, duration),
        }
    }

    fn advance(&mut self, delta: f32) {
        let target = self.time + delta * self.speed;
        self.time = self.normalized(target);
        if self.playback == Playback::Once && target != self.time {
            self.playing = false;
            log::debug!("Animation finished after {:.2}s", self.track.duration());
        }
    }
}

impl GameComponent for AnimationComponent {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, delta: f32) {
        if self.playing {
            self.advance(delta);
        }
        let pose = self.track.sample(self.time);
        if let Some(transform) = self.transform.and_then(|own| ctx.transforms.get_mut(own)) {
            transform.set_translation(pose.translation);
            transform.set_rotation(pose.rotation);
            transform.set_scale(pose.scale);
        }
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.playing = true;
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
    use crate::foundation::math::constants::HALF_PI;
    use crate::foundation::time::Timer;
    use crate::input::Input;
    use crate::scene::{Transform, Transforms};
    use approx::assert_relative_eq;

    fn slide() -> Track {
        Track::new(vec![
            Keyframe::at(0.0, Vec3::zeros()),
            Keyframe::at(2.0, Vec3::new(4.0, 0.0, 0.0))
                .with_rotation(Quat::rotation_quaternion(&Vec3::y(), HALF_PI))
                .with_scale(Vec3::repeat(3.0)),
        ])
        .unwrap()
    }

    fn run(animation: &mut AnimationComponent, transforms: &mut Transforms, delta: f32) {
        let input = Input::new();
        let timer = Timer::new();
        let mut globals = SharedGlobals::new();
        let mut ctx = FrameContext::new(&input, &timer, &mut globals, transforms);
        animation.update(&mut ctx, delta);
    }

    #[test]
    fn test_midpoint_interpolates_every_channel() {
        let pose = slide().sample(1.0);

        assert_relative_eq!(pose.translation, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(pose.scale, Vec3::repeat(2.0));
        assert_relative_eq!(pose.rotation.angle(), HALF_PI / 2.0, epsilon = 1.0e-5);
    }

    #[test]
    fn test_samples_outside_the_track_hold_end_poses() {
        let track = slide();
        assert_eq!(track.sample(-1.0).translation, Vec3::zeros());
        assert_eq!(track.sample(5.0).translation, Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_invalid_tracks_are_rejected() {
        assert_eq!(Track::new(Vec::new()), Err(AnimationError::Empty));
        let backwards = vec![Keyframe::at(1.0, Vec3::zeros()), Keyframe::at(0.5, Vec3::zeros())];
        assert_eq!(
            Track::new(backwards),
            Err(AnimationError::OutOfOrder { index: 1, time: 0.5 })
        );
    }

    #[test]
    fn test_looping_wraps_past_the_end() {
        let mut transforms = Transforms::new();
        let own = transforms.insert(Transform::default());
        let mut animation = AnimationComponent::new(slide());
        animation.attach(own);

        run(&mut animation, &mut transforms, 2.5);

        assert_relative_eq!(animation.time(), 0.5);
        assert!(animation.is_playing());
        assert_relative_eq!(transforms.get(own).unwrap().translation(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_play_once_holds_last_pose_and_stops() {
        let mut transforms = Transforms::new();
        let own = transforms.insert(Transform::default());
        let mut animation = AnimationComponent::new(slide()).with_playback(Playback::Once);
        animation.attach(own);

        run(&mut animation, &mut transforms, 3.0);
        assert!(!animation.is_playing());
        assert_relative_eq!(animation.time(), 2.0);
        assert_relative_eq!(transforms.get(own).unwrap().scale(), Vec3::repeat(3.0));

        animation.reset();
        run(&mut animation, &mut transforms, 0.5);
        assert_relative_eq!(transforms.get(own).unwrap().translation(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_reverse_playback_wraps_to_the_end() {
        let mut transforms = Transforms::new();
        let own = transforms.insert(Transform::default());
        let mut animation = AnimationComponent::new(slide()).with_speed(-1.0);
        animation.attach(own);

        run(&mut animation, &mut transforms, 0.5);
        assert_relative_eq!(animation.time(), 1.5);
    }

    #[test]
    fn test_paused_animation_keeps_its_pose() {
        let mut transforms = Transforms::new();
        let own = transforms.insert(Transform::default());
        let mut animation = AnimationComponent::new(slide());
        animation.attach(own);
        animation.seek(1.0);
        animation.pause();

        run(&mut animation, &mut transforms, 0.7);
        assert_relative_eq!(animation.time(), 1.0);
        assert_relative_eq!(transforms.get(own).unwrap().translation(), Vec3::new(2.0, 0.0, 0.0));
    }
}
