//! # Lumen Engine
//!
//! A small scene-graph game engine with a forward multi-pass lighting renderer.
//!
//! ## Features
//!
//! - **Scene graph**: `GameObject` nodes owning components and children, with
//!   transforms kept in an arena and world matrices cached per node
//! - **Forward lighting**: one ambient pass plus one additive pass per light
//! - **Entities**: rigid bodies driven by keyboard, AI or a remote action queue
//! - **Assets**: OBJ meshes and images behind a path-keyed cache
//! - **Headless**: a recording render backend and a scripted window, so the
//!   whole engine runs without a GPU
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let aspect = engine.globals().aspect_ratio();
//!         let mut camera = engine.create_object(Transform::default());
//!         camera.add_component(Camera::from_config(&engine.config().renderer, aspect));
//!         engine.add_object(camera);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let window = HeadlessWindow::new(1280, 720).with_frame_budget(60);
//!     let mut engine = Engine::new(EngineConfig::default(), Box::new(window), Box::new(RecordingBackend::new()))?;
//!     engine.run(&mut MyApp)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;
pub mod foundation;

// Scene and rendering
pub mod components;
pub mod render;
pub mod scene;

// Simulation
pub mod entity;
pub mod physics;

// Platform seams
pub mod assets;
pub mod input;
pub mod window;

mod application;
mod engine;

pub use application::{AppError, AppEvent, Application};
pub use engine::{Engine, EngineError, StepReport};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, ImageData, ResourceCache},
        components::{
            AnimationComponent, ArcBall, Camera, DirectionalLight, FollowComponent, FreeLook, FreeMove, Keyframe,
            LookAtComponent, MeshRenderer, Playback, PointLight, Skybox, SpotLight, Track,
        },
        core::{Config, EngineConfig, EntityConfig, FrameContext, SharedGlobals},
        entity::{spawn_entity, Controller, Entity, EntityAction, EntitySpawn},
        foundation::{
            math::{Mat4, Mat4Ext, Quat, QuatExt, Vec2, Vec3, Vec4},
            time::{Stopwatch, Timer},
        },
        input::{Input, KeyCode, MouseButton},
        physics::{BodyHandle, PhysicsWorld, RigidBody, SimpleWorld, SphereBody},
        render::{
            Attenuation, Material, Mesh, MeshData, RecordingBackend, RenderBackend, RenderingEngine, Specular,
            Texture,
        },
        scene::{GameComponent, GameObject, Scene, Transform, TransformId},
        window::{HeadlessWindow, Window},
        AppError, AppEvent, Application, Engine, EngineError,
    };
}
