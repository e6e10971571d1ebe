//! Built-in sphere-body world
//!
//! Semi-implicit Euler integration with per-body damping applied as
//! `(1 - damping)^dt`, a horizontal ground plane, and sleeping for bodies that
//! stay slow for a while.

use std::any::Any;

use slotmap::SlotMap;

use crate::foundation::math::{Quat, Vec3};
use crate::physics::{BodyHandle, BodyPose, PhysicsWorld, Ray, RayHit, RigidBody};

/// Standard gravity along -Z
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, 0.0, -9.81);

const SLEEP_LINEAR_THRESHOLD: f32 = 0.8;
const SLEEP_ANGULAR_THRESHOLD: f32 = 1.0;
const TIME_TO_SLEEP: f32 = 2.0;

/// A solid sphere
#[derive(Debug, Clone, PartialEq)]
pub struct SphereBody {
    radius: f32,
    mass: f32,
    pose: BodyPose,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    linear_damping: f32,
    angular_damping: f32,
    active: bool,
    sleep_timer: f32,
}

impl SphereBody {
    /// Create a sphere at the origin. A non-positive mass makes the body static.
    pub fn new(radius: f32, mass: f32) -> Self {
        Self {
            radius,
            mass,
            pose: BodyPose::default(),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            active: true,
            sleep_timer: 0.0,
        }
    }

    /// Place the body
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.pose.position = position;
        self
    }

    /// Set the damping fractions, each clamped to `[0, 1]`
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear.clamp(0.0, 1.0);
        self.angular_damping = angular.clamp(0.0, 1.0);
        self
    }

    /// Sphere radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Body mass
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Whether the body never moves
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    fn inverse_mass(&self) -> f32 {
        if self.is_static() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    fn inverse_inertia(&self) -> f32 {
        let inertia = 0.4 * self.mass * self.radius * self.radius;
        if self.is_static() || inertia <= f32::EPSILON {
            0.0
        } else {
            1.0 / inertia
        }
    }

    fn integrate(&mut self, gravity: &Vec3, ground: Option<f32>, delta: f32) {
        if self.is_static() || !self.active {
            return;
        }

        self.linear_velocity += gravity * delta;
        self.linear_velocity *= (1.0 - self.linear_damping).powf(delta);
        self.angular_velocity *= (1.0 - self.angular_damping).powf(delta);

        self.pose.position += self.linear_velocity * delta;
        if self.angular_velocity.norm() > f32::EPSILON {
            self.pose.rotation = Quat::from_scaled_axis(self.angular_velocity * delta) * self.pose.rotation;
            self.pose.rotation.renormalize();
        }

        if let Some(ground) = ground {
            let floor = ground + self.radius;
            if self.pose.position.z < floor {
                self.pose.position.z = floor;
                self.linear_velocity.z = self.linear_velocity.z.max(0.0);
            }
        }

        let slow = self.linear_velocity.norm() < SLEEP_LINEAR_THRESHOLD
            && self.angular_velocity.norm() < SLEEP_ANGULAR_THRESHOLD;
        if slow {
            self.sleep_timer += delta;
            if self.sleep_timer >= TIME_TO_SLEEP {
                self.active = false;
                self.linear_velocity = Vec3::zeros();
                self.angular_velocity = Vec3::zeros();
            }
        } else {
            self.sleep_timer = 0.0;
        }
    }

    fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        // Solve |origin + t*direction - center|^2 = radius^2 with a unit direction
        let oc = ray.origin - self.pose.position;
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let t = if -b - root > 0.0 {
            -b - root
        } else if -b + root > 0.0 {
            -b + root
        } else {
            return None;
        };
        let point = ray.point_at(t);
        Some((t, (point - self.pose.position) / self.radius))
    }
}

impl RigidBody for SphereBody {
    fn world_transform(&self) -> BodyPose {
        self.pose
    }

    fn set_world_transform(&mut self, pose: BodyPose) {
        self.pose = pose;
    }

    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    fn apply_central_impulse(&mut self, impulse: Vec3) {
        self.linear_velocity += impulse * self.inverse_mass();
    }

    fn apply_torque_impulse(&mut self, torque: Vec3) {
        self.angular_velocity += torque * self.inverse_inertia();
    }

    fn activate(&mut self) {
        self.active = true;
        self.sleep_timer = 0.0;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Sphere bodies over an optional ground plane at constant height
#[derive(Debug)]
pub struct SimpleWorld {
    bodies: SlotMap<BodyHandle, SphereBody>,
    gravity: Vec3,
    ground: Option<f32>,
}

impl Default for SimpleWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleWorld {
    /// World with standard gravity and a ground plane at `z = 0`
    pub fn new() -> Self {
        Self {
            bodies: SlotMap::with_key(),
            gravity: DEFAULT_GRAVITY,
            ground: Some(0.0),
        }
    }

    /// Replace gravity
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Move or remove the ground plane
    pub fn with_ground(mut self, ground: Option<f32>) -> Self {
        self.ground = ground;
        self
    }

    /// Add a body
    pub fn add_body(&mut self, body: SphereBody) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Remove a body
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<SphereBody> {
        self.bodies.remove(handle)
    }

    /// Concrete body access
    pub fn sphere(&self, handle: BodyHandle) -> Option<&SphereBody> {
        self.bodies.get(handle)
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the world has no bodies
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn ground_hit(&self, ray: &Ray, length: f32) -> Option<RayHit> {
        let ground = self.ground?;
        if ray.direction.z >= 0.0 || ray.origin.z < ground {
            return None;
        }
        let t = (ground - ray.origin.z) / ray.direction.z;
        (t <= length).then(|| RayHit {
            body: None,
            distance: t,
            point: ray.point_at(t),
            normal: Vec3::z(),
        })
    }
}

impl PhysicsWorld for SimpleWorld {
    fn step(&mut self, delta: f32) {
        if delta <= 0.0 {
            return;
        }
        let gravity = self.gravity;
        let ground = self.ground;
        for body in self.bodies.values_mut() {
            body.integrate(&gravity, ground, delta);
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<&dyn RigidBody> {
        self.bodies.get(handle).map(|body| body as &dyn RigidBody)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut dyn RigidBody> {
        self.bodies.get_mut(handle).map(|body| body as &mut dyn RigidBody)
    }

    fn ray_cast(&self, from: &Vec3, to: &Vec3, exclude: Option<BodyHandle>) -> Option<RayHit> {
        let (ray, length) = Ray::between(from, to)?;

        let closest_body = self
            .bodies
            .iter()
            .filter(|(handle, _)| Some(*handle) != exclude)
            .filter_map(|(handle, body)| {
                let (distance, normal) = body.intersect_ray(&ray)?;
                (distance <= length).then(|| RayHit {
                    body: Some(handle),
                    distance,
                    point: ray.point_at(distance),
                    normal,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        match (closest_body, self.ground_hit(&ray, length)) {
            (Some(body), Some(ground)) => Some(if ground.distance < body.distance { ground } else { body }),
            (body, ground) => body.or(ground),
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
    use approx::assert_relative_eq;

    #[test]
    fn test_body_falls_and_rests_on_ground() {
        let mut world = SimpleWorld::new();
        let handle = world.add_body(SphereBody::new(1.0, 10.0).with_position(Vec3::new(0.0, 0.0, 5.0)));

        for _ in 0..240 {
            world.step(1.0 / 60.0);
        }

        let pose = world.body(handle).unwrap().world_transform();
        assert_relative_eq!(pose.position.z, 1.0, epsilon = 1.0e-5);
        assert!(world.body(handle).unwrap().linear_velocity().z.abs() < 1.0e-5);
    }

    #[test]
    fn test_damping_slows_body() {
        let mut world = SimpleWorld::new().with_gravity(Vec3::zeros()).with_ground(None);
        let handle = world.add_body(SphereBody::new(1.0, 1.0).with_damping(0.5, 0.0));
        world.body_mut(handle).unwrap().set_linear_velocity(Vec3::new(4.0, 0.0, 0.0));

        world.step(1.0);

        assert_relative_eq!(world.body(handle).unwrap().linear_velocity().x, 2.0, epsilon = 1.0e-5);
    }

    #[test]
    fn test_impulse_scales_by_inverse_mass() {
        let mut body = SphereBody::new(1.0, 4.0);
        body.apply_central_impulse(Vec3::new(8.0, 0.0, 0.0));
        assert_relative_eq!(body.linear_velocity(), Vec3::new(2.0, 0.0, 0.0));

        let mut fixed = SphereBody::new(1.0, 0.0);
        fixed.apply_central_impulse(Vec3::new(8.0, 0.0, 0.0));
        assert_eq!(fixed.linear_velocity(), Vec3::zeros());
    }

    #[test]
    fn test_resting_body_sleeps_until_activated() {
        let mut world = SimpleWorld::new();
        let handle = world.add_body(SphereBody::new(1.0, 1.0).with_position(Vec3::new(0.0, 0.0, 1.0)));

        for _ in 0..180 {
            world.step(1.0 / 60.0);
        }
        assert!(!world.body(handle).unwrap().is_active());

        world.body_mut(handle).unwrap().activate();
        assert!(world.body(handle).unwrap().is_active());
    }

    #[test]
    fn test_ray_cast_finds_closest_and_honours_exclude() {
        let mut world = SimpleWorld::new().with_ground(None);
        let near = world.add_body(SphereBody::new(1.0, 1.0).with_position(Vec3::new(5.0, 0.0, 0.0)));
        let far = world.add_body(SphereBody::new(1.0, 1.0).with_position(Vec3::new(10.0, 0.0, 0.0)));
        let from = Vec3::zeros();
        let to = Vec3::new(50.0, 0.0, 0.0);

        let hit = world.ray_cast(&from, &to, None).unwrap();
        assert_eq!(hit.body, Some(near));
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1.0e-5);
        assert_relative_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1.0e-5);

        let hit = world.ray_cast(&from, &to, Some(near)).unwrap();
        assert_eq!(hit.body, Some(far));

        assert!(world.ray_cast(&from, &Vec3::new(3.0, 0.0, 0.0), None).is_none());
    }

    #[test]
    fn test_ray_cast_hits_ground() {
        let world = SimpleWorld::new();
        let hit = world
            .ray_cast(&Vec3::new(0.0, 0.0, 2.0), &Vec3::new(0.0, 0.0, -1.0), None)
            .unwrap();
        assert_eq!(hit.body, None);
        assert_relative_eq!(hit.distance, 2.0);
        assert!(world
            .ray_cast(&Vec3::new(0.0, 0.0, 2.0), &Vec3::new(0.0, 0.0, 1.0), None)
            .is_none());
    }
}
