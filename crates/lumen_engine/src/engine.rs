//! Core engine implementation
//!
//! The engine owns every subsystem and drives the main loop. Each frame it
//! drains window events, then runs fixed-length ticks while the frame gate is
//! open, and renders once if at least one tick ran. A tick is:
//!
//! 1. scene input phase
//! 2. [`Application::update`]
//! 3. physics step
//! 4. scene update phase
//! 5. end-of-tick bookkeeping (resize flag, input edges, hit delivery)

use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

use crate::application::{AppEvent, Application};
use crate::assets::{AssetError, ResourceCache};
use crate::core::{ConfigError, EngineConfig, SharedGlobals};
use crate::foundation::math::Vec3;
use crate::foundation::time::Timer;
use crate::input::Input;
use crate::physics::PhysicsWorld;
use crate::render::{FrameStats, Mesh, MeshData, RenderBackend, RenderError, RenderingEngine, Texture};
use crate::scene::{GameObject, Scene, Transform, TransformId};
use crate::window::Window;

const IDLE_SLEEP: Duration = Duration::from_millis(1);
const PAUSED_SLEEP: Duration = Duration::from_millis(10);

/// What one call to [`Engine::step`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Simulation ticks run
    pub ticks: u32,
    /// Stats of the rendered frame, if one was rendered
    pub frame: Option<FrameStats>,
}

#[derive(Debug, Default)]
struct FpsCounter {
    frames: u32,
    elapsed: f32,
    passes: usize,
}

/// Main engine struct
///
/// The engine coordinates all subsystems and manages the main loop.
pub struct Engine {
    config: EngineConfig,
    window: Box<dyn Window>,
    renderer: RenderingEngine,
    scene: Scene,
    globals: SharedGlobals,
    input: Input,
    timer: Timer,
    resources: ResourceCache,
    running: bool,
    paused: bool,
    frames_rendered: u64,
    fps: FpsCounter,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("frames_rendered", &self.frames_rendered)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create a new engine instance
    pub fn new(
        config: EngineConfig,
        window: Box<dyn Window>,
        backend: Box<dyn RenderBackend>,
    ) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate().map_err(ConfigError::Invalid)?;

        let renderer = RenderingEngine::new(backend, &config.renderer)?;
        let mut globals = SharedGlobals::new();
        globals.set_ambient_light(Vec3::repeat(config.renderer.ambient_intensity));
        let (width, height) = window.size();
        globals.set_window_size(width, height);
        let resources = ResourceCache::new(&config.assets.root);

        log::info!(
            "Engine ready: {}x{} window, {} ticks per second",
            width,
            height,
            config.timing.frame_cap
        );
        Ok(Self {
            config,
            window,
            renderer,
            scene: Scene::new(),
            globals,
            input: Input::new(),
            timer: Timer::new(),
            resources,
            running: true,
            paused: false,
            frames_rendered: 0,
            fps: FpsCounter::default(),
        })
    }

    /// Run `app` until it quits or the window closes, then tear the scene down
    pub fn run<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::Application(format!("App initialization: {}", e)))?;

        log::info!("Starting main loop...");
        self.timer.reset();
        let result = self.main_loop(app);
        if let Err(e) = &result {
            log::error!("Main loop stopped: {}", e);
        }

        app.cleanup(self);
        self.shutdown();
        result
    }

    fn main_loop<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        while self.is_running() {
            self.process_events(app)?;
            if self.paused {
                self.timer.reset();
                std::thread::sleep(PAUSED_SLEEP);
                continue;
            }

            self.timer.tick();
            let report = self.run_frame(app)?;
            if report.ticks == 0 {
                std::thread::sleep(IDLE_SLEEP);
            }
        }
        Ok(())
    }

    /// One iteration of the main loop with an externally measured `elapsed` time
    pub fn step<A: Application>(&mut self, app: &mut A, elapsed: f32) -> Result<StepReport, EngineError> {
        self.process_events(app)?;
        if self.paused {
            self.timer.reset();
            return Ok(StepReport::default());
        }
        self.timer.advance(elapsed);
        self.run_frame(app)
    }

    fn process_events<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        for event in self.window.poll_events() {
            match event {
                AppEvent::WindowCloseRequested => {
                    log::info!("Window close requested");
                    self.running = false;
                }
                AppEvent::WindowFocused => self.paused = false,
                AppEvent::WindowUnfocused => self.paused = true,
                AppEvent::WindowResized { width, height } => {
                    log::debug!("Window resized to {}x{}", width, height);
                    self.globals.set_window_size(width, height);
                }
                _ => {
                    self.input.handle_event(&event);
                }
            }
            app.handle_event(self, &event)
                .map_err(|e| EngineError::Application(format!("App event: {}", e)))?;
        }
        Ok(())
    }

    fn run_frame<A: Application>(&mut self, app: &mut A) -> Result<StepReport, EngineError> {
        let frame_time = self.config.timing.frame_time();
        let mut report = StepReport::default();
        while self.running && self.timer.consume_frame(frame_time) {
            self.tick(app, frame_time)?;
            report.ticks += 1;
        }
        if report.ticks == 0 {
            return Ok(report);
        }

        let stats = self.renderer.render(&mut self.scene, &mut self.globals)?;
        self.window.swap_buffers();
        self.frames_rendered += 1;
        self.count_frame(&stats);
        report.frame = Some(stats);
        Ok(report)
    }

    fn tick<A: Application>(&mut self, app: &mut A, delta: f32) -> Result<(), EngineError> {
        self.scene.input(&self.input, &self.timer, &mut self.globals, delta);
        app.update(self, delta)
            .map_err(|e| EngineError::Application(format!("App update: {}", e)))?;
        if let Some(physics) = self.globals.physics_mut() {
            physics.step(delta);
        }
        self.scene.update(&self.input, &self.timer, &mut self.globals, delta);

        self.globals.clear_resized();
        self.input.end_frame();
        self.globals.deliver_hits();
        Ok(())
    }

    fn count_frame(&mut self, stats: &FrameStats) {
        self.fps.frames += 1;
        self.fps.passes += stats.passes;
        self.fps.elapsed += self.timer.delta_time();
        if self.fps.elapsed >= 1.0 {
            log::debug!(
                "{} fps, {} passes, {} lights",
                self.fps.frames,
                self.fps.passes,
                stats.lights
            );
            self.fps = FpsCounter::default();
        }
    }

    fn shutdown(&mut self) {
        self.scene.teardown(&mut self.globals);
        self.resources.clear(self.renderer.backend_mut());
        self.running = false;
        log::info!("Engine shutdown complete after {} frames", self.frames_rendered);
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop would keep going
    pub fn is_running(&self) -> bool {
        self.running && !self.window.should_close()
    }

    /// Whether ticks are suspended because the window lost focus
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scene graph
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene graph
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Shared registry
    pub fn globals(&self) -> &SharedGlobals {
        &self.globals
    }

    /// Mutable shared registry
    pub fn globals_mut(&mut self) -> &mut SharedGlobals {
        &mut self.globals
    }

    /// Scene and registry borrowed together
    pub fn scene_and_globals(&mut self) -> (&mut Scene, &mut SharedGlobals) {
        (&mut self.scene, &mut self.globals)
    }

    /// Input state of the current tick
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Frame timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Renderer
    pub fn renderer(&self) -> &RenderingEngine {
        &self.renderer
    }

    /// Mutable renderer
    pub fn renderer_mut(&mut self) -> &mut RenderingEngine {
        &mut self.renderer
    }

    /// Resource cache
    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    /// Window
    pub fn window(&self) -> &dyn Window {
        self.window.as_ref()
    }

    /// Install the physics world stepped every tick
    pub fn set_physics(&mut self, physics: Box<dyn PhysicsWorld>) {
        self.globals.set_physics(physics);
    }

    /// Capture or release the cursor
    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.input.set_cursor_locked(locked);
        self.window.set_cursor_locked(locked);
    }

    /// Detached node in the scene's transform arena
    pub fn create_object(&mut self, transform: Transform) -> GameObject {
        self.scene.create_object(transform)
    }

    /// Attach `object` under the scene root
    pub fn add_object(&mut self, object: GameObject) -> TransformId {
        self.scene.add_object(object, &mut self.globals)
    }

    /// Load a mesh through the cache
    pub fn load_mesh(&mut self, path: impl AsRef<Path>) -> Result<Rc<Mesh>, AssetError> {
        self.resources.mesh(self.renderer.backend_mut(), path)
    }

    /// Upload generated geometry under `name`
    pub fn mesh_from_data(&mut self, name: &str, data: &MeshData) -> Result<Rc<Mesh>, AssetError> {
        self.resources.mesh_from_data(self.renderer.backend_mut(), name, data)
    }

    /// Load a texture through the cache
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<Rc<Texture>, AssetError> {
        self.resources.texture(self.renderer.backend_mut(), path)
    }

    /// One-pixel texture of the given colour
    pub fn solid_texture(&mut self, rgba: [u8; 4]) -> Result<Rc<Texture>, AssetError> {
        self.resources.solid_texture(self.renderer.backend_mut(), rgba)
    }

    /// Free cached meshes and textures no scene node uses any more
    pub fn purge_resources(&mut self) -> usize {
        self.resources.purge_unused(self.renderer.backend_mut())
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Rendering error
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Asset system error
    #[error("Asset system error: {0}")]
    Asset(#[from] AssetError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    Application(String),
}
