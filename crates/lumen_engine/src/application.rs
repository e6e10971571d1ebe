//! Application trait and lifecycle management

use thiserror::Error;

use crate::assets::AssetError;
use crate::engine::{Engine, EngineError};
use crate::render::{LightError, RenderError};

/// Application lifecycle trait
///
/// Implement this trait to build a game on the engine. The engine calls
/// [`Application::update`] once per simulation tick, between the scene's
/// input phase and the physics step.
pub trait Application {
    /// Build the initial scene
    ///
    /// Called once before the main loop. Load assets and add objects here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Per-tick game logic
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Fixed tick length in seconds
    fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Observe a window or input event after the engine handled it
    fn handle_event(&mut self, _engine: &mut Engine, _event: &AppEvent) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once after the main loop, before the scene is torn down
    fn cleanup(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Asset loading error
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Renderer setup error
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Light construction error
    #[error("Light error: {0}")]
    Light(#[from] LightError),

    /// Game logic error
    #[error("Game logic error: {0}")]
    GameLogic(String),
}

/// Application events
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Window was resized
    WindowResized {
        /// New window width
        width: u32,
        /// New window height
        height: u32,
    },

    /// Window close requested
    WindowCloseRequested,

    /// Window gained focus
    WindowFocused,

    /// Window lost focus
    WindowUnfocused,

    /// Key was pressed
    KeyPressed(crate::input::KeyCode),

    /// Key was released
    KeyReleased(crate::input::KeyCode),

    /// Key input event
    KeyInput {
        /// The key that was pressed/released
        key: crate::input::KeyCode,
        /// Whether the key was pressed (true) or released (false)
        pressed: bool,
    },

    /// Mouse button event
    MouseButton {
        /// The mouse button that was pressed/released
        button: crate::input::MouseButton,
        /// Whether the button was pressed (true) or released (false)
        pressed: bool,
    },

    /// Mouse movement
    MouseMoved {
        /// New X coordinate
        x: f64,
        /// New Y coordinate
        y: f64,
    },

    /// Mouse wheel
    MouseWheel {
        /// Horizontal scroll delta
        delta_x: f64,
        /// Vertical scroll delta
        delta_y: f64,
    },
}
