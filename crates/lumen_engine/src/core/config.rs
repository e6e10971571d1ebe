//! # Engine Configuration
//!
//! Every tunable of the engine in one serde tree. Sections carry builder-style
//! `with_*` setters and a `validate()` that reports the first bad value.
//!
//! ## Sections
//!
//! - **window**: title and initial size
//! - **renderer**: projection, ambient light and clear colour
//! - **timing**: frame cap of the fixed-timestep gate
//! - **logging**: default log filter
//! - **assets**: asset root directory
//! - **entity**: movement, physics body and combat constants of entities
//!
//! Every section is `#[serde(default)]`, so a file only needs the values it
//! changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
}

impl WindowConfig {
    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the initial size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Window size must be non-zero, got {}x{}", self.width, self.height));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lumen".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// # Renderer Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip distance
    pub z_near: f32,
    /// Far clip distance
    pub z_far: f32,
    /// Grey level of the ambient light
    pub ambient_intensity: f32,
    /// RGBA clear colour
    pub clear_color: [f32; 4],
}

impl RendererConfig {
    /// Set the field of view
    pub fn with_fov(mut self, degrees: f32) -> Self {
        self.fov_degrees = degrees;
        self
    }

    /// Set the clip planes
    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.z_near = near;
        self.z_far = far;
        self
    }

    /// Set the ambient grey level
    pub fn with_ambient(mut self, intensity: f32) -> Self {
        self.ambient_intensity = intensity;
        self
    }

    /// Set the clear colour
    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(format!("Field of view must be in (0, 180) degrees, got {}", self.fov_degrees));
        }
        if self.z_near <= 0.0 || self.z_far <= self.z_near {
            return Err(format!(
                "Clip planes must satisfy 0 < near < far, got near {} far {}",
                self.z_near, self.z_far
            ));
        }
        if self.ambient_intensity < 0.0 {
            return Err("Ambient intensity cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            z_near: 0.1,
            z_far: 1000.0,
            ambient_intensity: 0.2,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// # Timing Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Update ticks per second
    pub frame_cap: u32,
}

impl TimingConfig {
    /// Set the frame cap
    pub fn with_frame_cap(mut self, frame_cap: u32) -> Self {
        self.frame_cap = frame_cap;
        self
    }

    /// Seconds per tick
    pub fn frame_time(&self) -> f32 {
        1.0 / self.frame_cap.max(1) as f32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_cap == 0 {
            return Err("Frame cap must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { frame_cap: 60 }
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl LoggingConfig {
    /// Set the level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.level.to_ascii_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(format!("Unknown log level '{other}'")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for assets
    pub root: String,
}

impl AssetConfig {
    /// Set the assets directory
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.root.is_empty() {
            return Err("Asset root cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self { root: "resources".to_string() }
    }
}

/// # Entity Configuration
///
/// Movement and combat constants shared by every entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Impulse per second of held movement input
    pub move_impulse_factor: f32,
    /// Torque impulse per second of held rotation input
    pub rotate_impulse_factor: f32,
    /// Impulse of one jump
    pub jump_units: f32,
    /// Cap on horizontal speed
    pub max_move_velocity: f32,
    /// Cap on upward speed
    pub max_jump_velocity: f32,
    /// Height bodies spawn at
    pub spawn_height: f32,
    /// Linear damping fraction
    pub linear_damping: f32,
    /// Angular damping fraction
    pub angular_damping: f32,
    /// Radius of the body sphere
    pub body_radius: f32,
    /// Mass of the body
    pub body_mass: f32,
    /// Seconds between jumps
    pub jump_cooldown: f32,
    /// Hit-scan range
    pub shooting_range: f32,
    /// Seconds between enemy shots
    pub shooting_interval: f32,
    /// Health lost per hit taken by a player
    pub player_damage_rate: f32,
    /// Health lost per hit taken by an enemy
    pub enemy_damage_rate: f32,
}

impl EntityConfig {
    /// Set the velocity caps
    pub fn with_velocity_caps(mut self, max_move: f32, max_jump: f32) -> Self {
        self.max_move_velocity = max_move;
        self.max_jump_velocity = max_jump;
        self
    }

    /// Set the body shape
    pub fn with_body(mut self, radius: f32, mass: f32) -> Self {
        self.body_radius = radius;
        self.body_mass = mass;
        self
    }

    /// Set the damage rates
    pub fn with_damage_rates(mut self, player: f32, enemy: f32) -> Self {
        self.player_damage_rate = player;
        self.enemy_damage_rate = enemy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_move_velocity <= 0.0 || self.max_jump_velocity <= 0.0 {
            return Err("Velocity caps must be positive".to_string());
        }
        if self.body_radius <= 0.0 || self.body_mass <= 0.0 {
            return Err("Entity bodies need a positive radius and mass".to_string());
        }
        if !(0.0..=1.0).contains(&self.linear_damping) || !(0.0..=1.0).contains(&self.angular_damping) {
            return Err("Damping must lie in [0, 1]".to_string());
        }
        if self.player_damage_rate < 0.0 || self.enemy_damage_rate < 0.0 {
            return Err("Damage rates cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            move_impulse_factor: 2.0e3,
            rotate_impulse_factor: 4.0e2,
            jump_units: 1.5e3,
            max_move_velocity: 8.5,
            max_jump_velocity: 6.0,
            spawn_height: 7.5,
            linear_damping: 0.1,
            angular_damping: 0.4,
            body_radius: 1.0,
            body_mass: 70.0,
            jump_cooldown: 1.5,
            shooting_range: 50.0,
            shooting_interval: 0.05,
            player_damage_rate: 0.0025,
            enemy_damage_rate: 0.025,
        }
    }
}

/// # Complete Engine Configuration
///
/// Top-level configuration; this is what applications hand to
/// [`Engine::new`](crate::engine::Engine::new).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window section
    pub window: WindowConfig,
    /// Renderer section
    pub renderer: RendererConfig,
    /// Timing section
    pub timing: TimingConfig,
    /// Logging section
    pub logging: LoggingConfig,
    /// Assets section
    pub assets: AssetConfig,
    /// Entity section
    pub entity: EntityConfig,
}

impl EngineConfig {
    /// Replace the window section
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Replace the renderer section
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the timing section
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Replace the logging section
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Replace the assets section
    pub fn with_assets(mut self, assets: AssetConfig) -> Self {
        self.assets = assets;
        self
    }

    /// Replace the entity section
    pub fn with_entity(mut self, entity: EntityConfig) -> Self {
        self.entity = entity;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.window.validate()?;
        self.renderer.validate()?;
        self.timing.validate()?;
        self.logging.validate()?;
        self.assets.validate()?;
        self.entity.validate()
    }

    /// Load and validate `path`, or fall back to defaults when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("lumen_config_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.renderer.fov_degrees, 70.0);
        assert_eq!(config.entity.max_move_velocity, 8.5);
    }

    #[test]
    fn test_toml_round_trip() {
        let path = temp_path("round_trip.toml");
        let config = EngineConfig::default()
            .with_window(WindowConfig::default().with_title("arena").with_size(800, 600))
            .with_timing(TimingConfig::default().with_frame_cap(30));

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_round_trip() {
        let path = temp_path("round_trip.ron");
        let config = EngineConfig::default().with_renderer(RendererConfig::default().with_ambient(0.5));

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = EngineConfig::from_str_as("[window]\ntitle = \"partial\"\n", ConfigFormat::Toml).unwrap();
        assert_eq!(config.window.title, "partial");
        assert_eq!(config.window.height, 720);
        assert_eq!(config.timing, TimingConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(RendererConfig::default().with_clip_planes(1.0, 0.5).validate().is_err());
        assert!(TimingConfig::default().with_frame_cap(0).validate().is_err());
        assert!(LoggingConfig::default().with_level("loud").validate().is_err());
        assert!(WindowConfig::default().with_size(0, 10).validate().is_err());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let config = EngineConfig::load_or_default(temp_path("missing.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_or_default_rejects_invalid_file() {
        let path = temp_path("invalid.toml");
        std::fs::write(&path, "[timing]\nframe_cap = 0\n").unwrap();
        let result = EngineConfig::load_or_default(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
