//! Arena demo application
//!
//! A player and a ring of enemies on a ground plane, each a physics-driven
//! entity with its own light. Runs headless for a fixed number of frames so it
//! works without a display; pass the frame count as the first argument.

use std::rc::Rc;

use lumen_engine::core::ConfigError;
use lumen_engine::entity::{entity_body, spawn_entity, Controller, Entity, EntitySpawn, HP_STAGES};
use lumen_engine::foundation::logging;
use lumen_engine::prelude::*;
use rand::Rng;
use thiserror::Error;

const CONFIG_PATH: &str = "arena.toml";
const DEFAULT_FRAMES: u64 = 600;
const ENEMY_COUNT: usize = 6;
const ARENA_RADIUS: f32 = 30.0;
const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, -15.0, 12.0);
const SKY_SIZE: f32 = 400.0;
const SKY_COLOR: [u8; 4] = [70, 110, 170, 255];

/// Diffuse colour per hp stage, empty to full health
const STAGE_COLORS: [[u8; 4]; HP_STAGES] = [
    [90, 20, 20, 255],
    [170, 40, 30, 255],
    [200, 120, 40, 255],
    [160, 190, 60, 255],
    [60, 200, 90, 255],
];

#[derive(Error, Debug)]
enum ArenaError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

struct ArenaApp {
    player: Option<TransformId>,
    enemies: Vec<TransformId>,
}

impl ArenaApp {
    fn new() -> Self {
        Self {
            player: None,
            enemies: Vec::new(),
        }
    }

    fn entity_hp(engine: &Engine, id: TransformId) -> Option<f32> {
        engine
            .scene()
            .root()
            .children()
            .iter()
            .find(|child| child.transform() == id)
            .and_then(|child| child.get_component::<Entity>())
            .map(Entity::hp)
    }

    fn build_ground(engine: &mut Engine) -> Result<(), AppError> {
        let mesh = engine.mesh_from_data("ground", &MeshData::plane(ARENA_RADIUS * 3.0))?;
        let texture = engine.solid_texture([110, 110, 120, 255])?;
        let material = Material::textured("ground", texture, Specular::default()).into_shared();

        let mut ground = engine.create_object(Transform::default());
        ground.add_component(MeshRenderer::new(mesh, material));
        engine.add_object(ground);
        Ok(())
    }

    fn build_sky(engine: &mut Engine) -> Result<(), AppError> {
        let mesh = engine.mesh_from_data("skybox", &Skybox::mesh_data(SKY_SIZE))?;
        let texture = engine.solid_texture(SKY_COLOR)?;

        let mut sky = engine.create_object(Transform::default());
        sky.add_component(MeshRenderer::new(mesh, Skybox::material(texture).into_shared()))
            .add_component(Skybox::new(Vec3::new(0.0, 0.0, 2.0)));
        engine.add_object(sky);
        Ok(())
    }

    fn build_sun(engine: &mut Engine) {
        let rotation = Quat::look_rotation(&Vec3::new(-0.3, 0.5, -1.0), &Vec3::y()).unwrap_or_else(Quat::identity);
        let mut sun = engine.create_object(Transform::default().with_rotation(rotation));
        sun.add_component(DirectionalLight::new(Vec3::new(1.0, 0.95, 0.85), 0.4));
        engine.add_object(sun);
    }

    fn build_camera(engine: &mut Engine, target: TransformId) {
        let aspect = engine.globals().aspect_ratio();
        let mut camera = engine.create_object(Transform::from_translation(CAMERA_OFFSET));
        camera
            .add_component(Camera::from_config(&engine.config().renderer, aspect))
            .add_component(FollowComponent::new(CAMERA_OFFSET, Some(target)))
            .add_component(LookAtComponent::new(Some(target)).with_up(Vec3::z()));
        engine.add_object(camera);
    }
}

impl Application for ArenaApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        log::info!("Building arena with {} enemies", ENEMY_COUNT);
        let config = engine.config().entity.clone();
        let mut rng = rand::thread_rng();

        let mut world = SimpleWorld::new();
        let player_body = world.add_body(entity_body(&config));
        let enemy_bodies: Vec<BodyHandle> = (0..ENEMY_COUNT).map(|_| world.add_body(entity_body(&config))).collect();
        engine.set_physics(Box::new(world));

        let mesh = engine.mesh_from_data("entity", &MeshData::cube(config.body_radius * 2.0))?;
        let mut stage_textures = Vec::with_capacity(HP_STAGES);
        for rgba in STAGE_COLORS {
            stage_textures.push(engine.solid_texture(rgba)?);
        }
        let stage_textures: [Rc<Texture>; HP_STAGES] = stage_textures
            .try_into()
            .map_err(|_| AppError::GameLogic("Stage texture count mismatch".to_string()))?;

        Self::build_ground(engine)?;
        Self::build_sky(engine)?;
        Self::build_sun(engine);

        let (scene, globals) = engine.scene_and_globals();
        let player = spawn_entity(
            scene,
            globals,
            &config,
            EntitySpawn {
                body: player_body,
                controller: Controller::Player,
                mesh: Rc::clone(&mesh),
                stage_textures: stage_textures.clone(),
                position: Vec2::zeros(),
            },
        )?;

        for body in enemy_bodies {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let distance = rng.gen_range(ARENA_RADIUS * 0.5..ARENA_RADIUS);
            let id = spawn_entity(
                scene,
                globals,
                &config,
                EntitySpawn {
                    body,
                    controller: Controller::Enemy,
                    mesh: Rc::clone(&mesh),
                    stage_textures: stage_textures.clone(),
                    position: Vec2::new(angle.cos(), angle.sin()) * distance,
                },
            )?;
            self.enemies.push(id);
        }

        Self::build_camera(engine, player);
        self.player = Some(player);
        log::info!("Arena ready: {} lights", engine.globals().light_count());
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        let Some(player) = self.player else {
            return Ok(());
        };
        if Self::entity_hp(engine, player).is_some_and(|hp| hp <= 0.0) {
            let standing = self
                .enemies
                .iter()
                .filter(|id| Self::entity_hp(engine, **id).is_some_and(|hp| hp > 0.0))
                .count();
            log::info!("Player defeated with {} enemies standing", standing);
            engine.quit();
        }
        Ok(())
    }

    fn handle_event(&mut self, engine: &mut Engine, event: &AppEvent) -> Result<(), AppError> {
        if let AppEvent::KeyPressed(KeyCode::Escape) = event {
            engine.quit();
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!("Arena closed after {} frames", engine.frames_rendered());
    }
}

fn main() -> Result<(), ArenaError> {
    let config = EngineConfig::load_or_default(CONFIG_PATH)?;
    logging::init_with_level(&config.logging.level);

    let frames = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);
    let window = HeadlessWindow::new(config.window.width, config.window.height).with_frame_budget(frames);

    let mut engine = Engine::new(config, Box::new(window), Box::new(RecordingBackend::new()))?;
    engine.run(&mut ArenaApp::new())?;
    Ok(())
}
