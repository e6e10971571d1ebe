//! Physics provider seam
//!
//! The engine consumes rigid bodies through [`PhysicsWorld`] and [`RigidBody`]
//! and never reaches into a solver. [`SimpleWorld`] is the built-in provider:
//! sphere bodies over a ground plane, enough to drive entities without a
//! third-party solver.

pub mod simple;

use std::any::Any;

use crate::foundation::math::{Quat, Vec3};

pub use simple::{SimpleWorld, SphereBody};

slotmap::new_key_type! {
    /// Handle to a body owned by a [`PhysicsWorld`]
    pub struct BodyHandle;
}

/// World-space position and orientation of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// Centre of mass
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
}

impl BodyPose {
    /// Create a pose
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for BodyPose {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Quat::identity())
    }
}

/// A ray for ray casting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Ray from `from` towards `to`; `None` when the points coincide
    pub fn between(from: &Vec3, to: &Vec3) -> Option<(Self, f32)> {
        let offset = to - from;
        let length = offset.norm();
        if length <= f32::EPSILON {
            return None;
        }
        Some((
            Self {
                origin: *from,
                direction: offset / length,
            },
            length,
        ))
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The body that was hit; `None` for static geometry such as the ground
    pub body: Option<BodyHandle>,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point
    pub normal: Vec3,
}

/// A simulated rigid body
pub trait RigidBody: Any {
    /// Current pose
    fn world_transform(&self) -> BodyPose;

    /// Teleport the body
    fn set_world_transform(&mut self, pose: BodyPose);

    /// Linear velocity
    fn linear_velocity(&self) -> Vec3;

    /// Replace the linear velocity
    fn set_linear_velocity(&mut self, velocity: Vec3);

    /// Angular velocity in radians per second about each world axis
    fn angular_velocity(&self) -> Vec3;

    /// Replace the angular velocity
    fn set_angular_velocity(&mut self, velocity: Vec3);

    /// Impulse through the centre of mass
    fn apply_central_impulse(&mut self, impulse: Vec3);

    /// Angular impulse
    fn apply_torque_impulse(&mut self, torque: Vec3);

    /// Wake the body if the solver put it to sleep
    fn activate(&mut self);

    /// Whether the body is being simulated
    fn is_active(&self) -> bool;
}

/// A rigid-body simulation
pub trait PhysicsWorld {
    /// Advance the simulation by `delta` seconds
    fn step(&mut self, delta: f32);

    /// Read access to a body
    fn body(&self, handle: BodyHandle) -> Option<&dyn RigidBody>;

    /// Write access to a body
    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut dyn RigidBody>;

    /// Closest hit on the segment `from -> to`, ignoring `exclude`
    fn ray_cast(&self, from: &Vec3, to: &Vec3, exclude: Option<BodyHandle>) -> Option<RayHit>;

    /// Downcast to concrete world type
    fn as_any(&self) -> &dyn Any;

    /// Downcast to mutable concrete world type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
