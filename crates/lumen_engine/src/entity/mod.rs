//! Physics-driven entities
//!
//! An [`Entity`] ties a scene node to a rigid body in the shared physics
//! world. Forces only ever go into the body; the node's transform is copied
//! from the body once per update, never the other way round.
//!
//! Entities damage each other through hit-scan shots: a hit is reported to
//! the shared hit ledger and applied by the victim one tick later.

pub mod actions;

pub use actions::{
    action_channel, ActionError, ActionReceiver, ActionSender, EntityAction, EntityState, WireAction,
    ACTION_PROTOCOL_VERSION, STATE_PAYLOAD_LEN,
};

use std::any::Any;
use std::rc::Rc;

use crate::components::{FollowComponent, MeshRenderer, PointLight};
use crate::core::{EntityConfig, FrameContext, SharedGlobals};
use crate::foundation::math::{Quat, QuatExt, Vec2, Vec3};
use crate::input::{Input, KeyCode, MouseButton};
use crate::physics::{BodyHandle, BodyPose, PhysicsWorld, SphereBody};
use crate::render::material::DIFFUSE;
use crate::render::{Attenuation, LightError, Material, Mesh, SharedMaterial, Specular, Texture};
use crate::scene::{GameComponent, Scene, Transform, TransformId};

/// Number of hp-dependent diffuse textures, from empty to full health
pub const HP_STAGES: usize = 5;

/// Offset of an entity's light from the entity, in world space
pub const LIGHT_OFFSET: Vec3 = Vec3::new(0.0, -0.5, 10.0);

const GROUND_CLEARANCE: f32 = 0.1;
const VELOCITY_EPSILON: f32 = 1.0e-9;

/// Who decides what an entity does each tick
#[derive(Debug)]
pub enum Controller {
    /// Keyboard and mouse
    Player,
    /// Shoots forward continuously
    Enemy,
    /// Actions queued by another thread
    Remote(ActionReceiver),
}

/// Cap horizontal speed at `max_move` and upward speed at `max_jump`
pub fn clamp_velocity(velocity: Vec3, max_move: f32, max_jump: f32) -> Vec3 {
    let mut clamped = velocity;
    let horizontal = velocity.x.hypot(velocity.y) + VELOCITY_EPSILON;
    if horizontal > max_move {
        let scale = max_move / horizontal;
        clamped.x *= scale;
        clamped.y *= scale;
    }
    clamped.z = clamped.z.min(max_jump);
    clamped
}

/// Diffuse stage for an hp percentage: 4 above 75%, down to 0 at 0%
pub fn hp_stage(percent: f32) -> usize {
    let lost = [75.0, 50.0, 25.0, 0.0].iter().filter(|threshold| percent <= **threshold).count();
    HP_STAGES - 1 - lost
}

/// Sphere body shaped and damped by the entity config
pub fn entity_body(config: &EntityConfig) -> SphereBody {
    SphereBody::new(config.body_radius, config.body_mass).with_damping(config.linear_damping, config.angular_damping)
}

/// Rotation whose forward axis points along +Y with +Z up
pub fn upright_rotation() -> Quat {
    Quat::look_rotation(&Vec3::y(), &Vec3::z()).unwrap_or_else(Quat::identity)
}

fn player_actions(input: &Input) -> Vec<EntityAction> {
    let bindings = [
        (KeyCode::W, EntityAction::MoveForward),
        (KeyCode::A, EntityAction::MoveLeft),
        (KeyCode::S, EntityAction::MoveBackward),
        (KeyCode::D, EntityAction::MoveRight),
        (KeyCode::E, EntityAction::RotateLeft),
        (KeyCode::Q, EntityAction::RotateRight),
        (KeyCode::Space, EntityAction::Jump),
    ];
    let mut actions: Vec<EntityAction> = bindings
        .iter()
        .filter(|(key, _)| input.is_key_down(*key))
        .map(|(_, action)| *action)
        .collect();
    if input.is_mouse_down(MouseButton::Left) {
        actions.push(EntityAction::Shoot);
    }
    actions
}

/// Component driving a node from a rigid body
#[derive(Debug)]
pub struct Entity {
    transform: Option<TransformId>,
    body: BodyHandle,
    controller: Controller,
    config: EntityConfig,
    hp: f32,
    max_hp: f32,
    damage_rate: f32,
    material: Option<SharedMaterial>,
    stage_textures: Option<[Rc<Texture>; HP_STAGES]>,
    stage: usize,
    jump_timer: f32,
    shot_timer: f32,
    on_ground: bool,
}

impl Entity {
    /// Entity at full health; players take the player damage rate, everyone else the enemy rate
    pub fn new(body: BodyHandle, controller: Controller, config: EntityConfig) -> Self {
        let damage_rate = match controller {
            Controller::Player => config.player_damage_rate,
            Controller::Enemy | Controller::Remote(_) => config.enemy_damage_rate,
        };
        Self {
            transform: None,
            body,
            controller,
            config,
            hp: 1.0,
            max_hp: 1.0,
            damage_rate,
            material: None,
            stage_textures: None,
            stage: HP_STAGES - 1,
            jump_timer: 0.0,
            shot_timer: 0.0,
            on_ground: false,
        }
    }

    /// Material whose diffuse texture follows the hp stage
    pub fn with_material(mut self, material: SharedMaterial) -> Self {
        self.material = Some(material);
        self
    }

    /// Diffuse textures indexed by hp stage
    pub fn with_stage_textures(mut self, textures: [Rc<Texture>; HP_STAGES]) -> Self {
        self.stage_textures = Some(textures);
        self
    }

    /// Override the hp lost per hit
    pub fn with_damage_rate(mut self, rate: f32) -> Self {
        self.damage_rate = rate;
        self
    }

    /// Body in the shared physics world
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Controller
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Current hp
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// Maximum hp
    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Set hp, clamped to `[0, max_hp]`
    pub fn set_hp(&mut self, hp: f32) {
        self.hp = hp.clamp(0.0, self.max_hp);
    }

    /// Hp as a percentage of the maximum
    pub fn hp_percent(&self) -> f32 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            self.hp / self.max_hp * 100.0
        }
    }

    /// Whether hp is above zero
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Current hp stage
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Result of the last ground check
    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    /// Lose one hit's worth of hp; never drops below zero
    pub fn get_hit(&mut self) {
        self.hp = (self.hp - self.damage_rate).max(0.0);
    }

    /// Wake the body and push it along `direction`
    pub fn move_along(&self, physics: &mut dyn PhysicsWorld, direction: &Vec3, amount: f32) {
        if let Some(body) = physics.body_mut(self.body) {
            body.activate();
            body.apply_central_impulse(direction * amount);
        }
    }

    /// Wake the body and spin it about `axis`
    pub fn rotate(&self, physics: &mut dyn PhysicsWorld, axis: &Vec3, amount: f32) {
        if let Some(body) = physics.body_mut(self.body) {
            body.activate();
            body.apply_torque_impulse(axis * amount);
        }
    }

    /// Jump along the body's up axis when grounded and off cooldown
    pub fn jump(&mut self, physics: &mut dyn PhysicsWorld) -> bool {
        if !self.on_ground || self.jump_timer > 0.0 {
            return false;
        }
        let Some(pose) = physics.body(self.body).map(|body| body.world_transform()) else {
            return false;
        };
        self.move_along(physics, &pose.rotation.up(), self.config.jump_units);
        self.jump_timer = self.config.jump_cooldown;
        self.on_ground = false;
        true
    }

    /// Fire along the body's forward axis; reports and returns the body hit
    pub fn shoot(&mut self, globals: &mut SharedGlobals) -> Option<BodyHandle> {
        if self.shot_timer > 0.0 {
            return None;
        }
        self.shot_timer = self.config.shooting_interval;

        let target = {
            let physics = globals.physics()?;
            let pose = physics.body(self.body)?.world_transform();
            let end = pose.position + pose.rotation.forward() * self.config.shooting_range;
            physics.ray_cast(&pose.position, &end, Some(self.body))?.body?
        };
        log::trace!("Body {:?} hit {:?}", self.body, target);
        globals.report_hit(target);
        Some(target)
    }

    /// Overwrite the body's pose and velocities
    pub fn apply_state(&self, physics: &mut dyn PhysicsWorld, state: &EntityState) {
        if let Some(body) = physics.body_mut(self.body) {
            body.activate();
            body.set_world_transform(BodyPose::new(state.position, state.rotation));
            body.set_linear_velocity(state.linear_velocity);
            body.set_angular_velocity(state.angular_velocity);
        }
    }

    /// Carry out one action
    pub fn perform(&mut self, action: EntityAction, globals: &mut SharedGlobals, delta: f32) {
        if let EntityAction::Shoot = action {
            self.shoot(globals);
            return;
        }
        let Some(physics) = globals.physics_mut() else {
            return;
        };
        let Some(rotation) = physics.body(self.body).map(|body| body.world_transform().rotation) else {
            return;
        };

        let impulse = self.config.move_impulse_factor * delta;
        let torque = self.config.rotate_impulse_factor * delta;
        match action {
            EntityAction::MoveForward => self.move_along(physics, &rotation.forward(), impulse),
            EntityAction::MoveLeft => self.move_along(physics, &rotation.left(), impulse),
            EntityAction::MoveBackward => self.move_along(physics, &rotation.back(), impulse),
            EntityAction::MoveRight => self.move_along(physics, &rotation.right(), impulse),
            EntityAction::RotateLeft => self.rotate(physics, &Vec3::z(), torque),
            EntityAction::RotateRight => self.rotate(physics, &Vec3::z(), -torque),
            EntityAction::Jump => {
                self.jump(physics);
            }
            EntityAction::ApplyState(state) => self.apply_state(physics, &state),
            EntityAction::Shoot => {}
        }
    }

    fn check_ground(&self, globals: &SharedGlobals) -> bool {
        let Some(physics) = globals.physics() else {
            return false;
        };
        let Some(pose) = physics.body(self.body).map(|body| body.world_transform()) else {
            return false;
        };
        let below = pose.position - Vec3::z() * (self.config.body_radius + GROUND_CLEARANCE);
        physics.ray_cast(&pose.position, &below, Some(self.body)).is_some()
    }

    /// Clamp the body's velocity and read back its pose
    fn sync_body(&self, globals: &mut SharedGlobals) -> Option<BodyPose> {
        let body = globals.physics_mut()?.body_mut(self.body)?;
        let velocity = body.linear_velocity();
        let clamped = clamp_velocity(velocity, self.config.max_move_velocity, self.config.max_jump_velocity);
        if clamped != velocity {
            body.set_linear_velocity(clamped);
        }
        Some(body.world_transform())
    }

    fn refresh_stage(&mut self) {
        let stage = hp_stage(self.hp_percent());
        if stage == self.stage {
            return;
        }
        self.stage = stage;
        if let (Some(material), Some(textures)) = (&self.material, &self.stage_textures) {
            material.borrow_mut().set(DIFFUSE, Rc::clone(&textures[stage]));
        }
        log::debug!("Body {:?} at {:.1}% hp, stage {}", self.body, self.hp_percent(), stage);
    }
}

impl GameComponent for Entity {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn input(&mut self, ctx: &mut FrameContext<'_>, delta: f32) {
        self.jump_timer = (self.jump_timer - delta).max(0.0);
        self.shot_timer = (self.shot_timer - delta).max(0.0);
        self.on_ground = self.check_ground(ctx.globals);
        if !self.is_alive() {
            return;
        }

        let actions = match &self.controller {
            Controller::Player => player_actions(ctx.input),
            Controller::Enemy => vec![EntityAction::Shoot],
            Controller::Remote(receiver) => receiver.drain(),
        };
        for action in actions {
            self.perform(action, ctx.globals, delta);
        }
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, _delta: f32) {
        if let Some(pose) = self.sync_body(ctx.globals) {
            if let Some(own) = self.transform {
                if let Some(transform) = ctx.transforms.get_mut(own) {
                    transform.set_translation(pose.position);
                    transform.set_rotation(pose.rotation);
                }
            }
        }

        for _ in 0..ctx.globals.hits_for(self.body) {
            self.get_hit();
        }
        self.refresh_stage();
    }

    fn reset(&mut self) {
        self.hp = self.max_hp;
        self.jump_timer = 0.0;
        self.shot_timer = 0.0;
        self.refresh_stage();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What [`spawn_entity`] needs besides the scene
#[derive(Debug)]
pub struct EntitySpawn {
    /// Body already added to the physics world
    pub body: BodyHandle,
    /// Controller
    pub controller: Controller,
    /// Shared mesh
    pub mesh: Rc<Mesh>,
    /// Diffuse textures indexed by hp stage
    pub stage_textures: [Rc<Texture>; HP_STAGES],
    /// Ground-plane position; the height comes from the entity config
    pub position: Vec2,
}

/// Build an entity node with its mesh, body bridge and light, and add it to `scene`.
///
/// The body is moved to the spawn position in an upright pose. The light is
/// "#def" for players and "#fed" for everyone else, and follows the entity at
/// [`LIGHT_OFFSET`].
pub fn spawn_entity(
    scene: &mut Scene,
    globals: &mut SharedGlobals,
    config: &EntityConfig,
    spawn: EntitySpawn,
) -> Result<TransformId, LightError> {
    let position = Vec3::new(spawn.position.x, spawn.position.y, config.spawn_height);
    let rotation = upright_rotation();
    if let Some(body) = globals.physics_mut().and_then(|physics| physics.body_mut(spawn.body)) {
        body.set_world_transform(BodyPose::new(position, rotation));
    }

    let hex = match spawn.controller {
        Controller::Player => "#def",
        Controller::Enemy | Controller::Remote(_) => "#fed",
    };
    let full_health = Rc::clone(&spawn.stage_textures[HP_STAGES - 1]);
    let material = Material::textured("entity", full_health, Specular { intensity: 0.0, exponent: 0.0 }).into_shared();

    let mut node = scene.create_object(Transform::from_translation(position).with_rotation(rotation));
    let entity_transform = node.transform();
    node.add_component(MeshRenderer::new(spawn.mesh, Rc::clone(&material)))
        .add_component(
            Entity::new(spawn.body, spawn.controller, config.clone())
                .with_material(material)
                .with_stage_textures(spawn.stage_textures),
        );

    let mut light = scene.create_object(Transform::from_translation(LIGHT_OFFSET));
    light
        .add_component(PointLight::from_hex(hex, 1.0, Attenuation::new(0.0, 0.0, 0.02))?)
        .add_component(FollowComponent::new(LIGHT_OFFSET, Some(entity_transform)));
    node.add_child(scene.transforms_mut(), light);

    log::info!("Spawned entity {:?} at {:?}", spawn.body, spawn.position);
    Ok(scene.add_object(node, globals))
}
