//! # Rendering System
//!
//! Forward multi-pass renderer over an abstract [`RenderBackend`].
//!
//! ## Architecture
//!
//! - **RenderingEngine**: runs the ambient pass and one additive pass per light
//! - **Shaders**: one forward shader per light kind, selected through [`ShaderLibrary`]
//! - **Materials**: untyped property bags read by the shaders' uniform upload
//! - **Backend**: state changes, programs, meshes and textures; [`RecordingBackend`]
//!   is the headless implementation used by tests and the demo
//!
//! No graphics API is assumed. "Rendering" here means the ordering of passes
//! and the state transitions between them.

use thiserror::Error;

pub mod backend;
pub mod headless;
pub mod mesh;
pub mod texture;
pub mod material;
pub mod shader;
pub mod forward;
pub mod lighting;
pub mod camera;
pub mod rendering_engine;

pub use backend::{
    BackendResult, BlendMode, ClearFlags, DepthFunc, FaceCulling, MeshHandle, ProgramHandle,
    RenderBackend, TextureHandle, UniformValue,
};
pub use camera::{MainCamera, Projection};
pub use forward::{ForwardAmbient, ForwardDirectional, ForwardPoint, ForwardSpot, ShaderLibrary};
pub use headless::{Command, DrawRecord, RecordingBackend};
pub use lighting::{ActiveLight, Attenuation, BaseLight, LightError, LightKind, LightParams, PointParams};
pub use material::{Material, SharedMaterial, Specular};
pub use mesh::{Mesh, MeshData, Vertex};
pub use rendering_engine::{FrameStats, RenderPass, RenderingEngine};
pub use shader::{Shader, ShaderProgram, UniformInputs};
pub use texture::Texture;

/// High-level rendering error types
///
/// Configuration problems (missing projection, unknown uniform names) and
/// runtime state problems (drawing a mesh the backend does not know) are both
/// fatal to the attempted operation.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A view-projection matrix was requested before any projection was set
    #[error("Perspective matrix not initialized: no camera projection configured")]
    ProjectionNotConfigured,

    /// `add_uniform` was given a name the compiled program does not declare
    #[error("Uniform '{name}' not found in program '{program}'")]
    UniformNotFound {
        /// Program name
        program: String,
        /// Requested uniform
        name: String,
    },

    /// `set_uniform` was given a name that was never registered
    #[error("Uniform '{name}' was never registered on program '{program}'")]
    UniformNotRegistered {
        /// Program name
        program: String,
        /// Requested uniform
        name: String,
    },

    /// A shader program failed to compile or link
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),

    /// Draw referenced a mesh the backend does not own
    #[error("Unknown mesh {0:?}")]
    UnknownMesh(MeshHandle),

    /// Bind referenced a texture the backend does not own
    #[error("Unknown texture {0:?}")]
    UnknownTexture(TextureHandle),

    /// Referenced a program the backend does not own
    #[error("Unknown program {0:?}")]
    UnknownProgram(ProgramHandle),

    /// Uniform upload or draw issued with no program bound
    #[error("No shader program bound")]
    NoProgramBound,

    /// A light shader ran without a matching active light
    #[error("Shader '{0}' requires an active light of its kind")]
    MissingActiveLight(&'static str),

    /// A component rendered before being attached to a node
    #[error("Component '{0}' is not attached to a transform")]
    ComponentDetached(&'static str),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
