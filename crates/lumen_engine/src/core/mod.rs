//! # Core Engine Module
//!
//! Configuration plus the state threaded through every traversal.
//!
//! ## Organization
//!
//! - **Config**: serde configuration for all engine subsystems
//! - **Globals**: the shared registry of lights, camera, physics and hits
//! - **Context**: the bundle handed to components each tick

pub mod config;
pub mod context;
pub mod globals;

pub use config::{
    AssetConfig, Config, ConfigError, ConfigFormat, EngineConfig, EntityConfig, LoggingConfig,
    RendererConfig, TimingConfig, WindowConfig,
};
pub use context::FrameContext;
pub use globals::{LightEntry, LightId, SharedGlobals};
