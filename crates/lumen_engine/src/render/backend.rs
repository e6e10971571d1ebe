//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait a graphics backend implements so the
//! rendering engine can drive it without knowing the underlying API.

use crate::assets::image_loader::ImageData;
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::{RenderError, Vertex};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Handle to a mesh resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Handle to a texture resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

bitflags::bitflags! {
    /// Buffers affected by [`RenderBackend::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Colour buffer
        const COLOR = 1;
        /// Depth buffer
        const DEPTH = 1 << 1;
    }
}

/// Framebuffer blending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source replaces destination
    Disabled,
    /// `src * ONE + dst * ONE`
    Additive,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    /// Pass when closer than the stored depth
    Less,
    /// Pass only at exactly the stored depth
    Equal,
}

/// Face culling setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceCulling {
    /// No culling
    Disabled,
    /// Cull back faces, with clockwise winding as the front face
    BackClockwise,
}

/// Value uploaded to a shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int` / sampler unit
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec3`
    Vec3(Vec3),
    /// `mat4`
    Mat4(Mat4),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

/// Main rendering backend trait
///
/// All state-setting calls are cheap and stateful, in the manner of a
/// classic immediate-mode API: the most recent blend, depth and program
/// settings apply to subsequent draws.
pub trait RenderBackend {
    /// Called once at the start of every rendered frame
    fn begin_frame(&mut self) {}

    /// Clear the selected buffers
    fn clear(&mut self, flags: ClearFlags);

    /// Colour used by colour clears
    fn set_clear_color(&mut self, color: Vec4);

    /// Face culling mode
    fn set_face_culling(&mut self, culling: FaceCulling);

    /// Blend mode for subsequent draws
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Enable or disable depth writes
    fn set_depth_write(&mut self, enabled: bool);

    /// Depth comparison for subsequent draws
    fn set_depth_func(&mut self, func: DepthFunc);

    /// Compile and link a program from vertex and fragment source
    fn compile_program(&mut self, name: &str, vertex_source: &str, fragment_source: &str)
        -> BackendResult<ProgramHandle>;

    /// Location of a uniform in a compiled program, if it exists
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<i32>;

    /// Make `program` current
    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()>;

    /// Upload a value to a uniform location of the current program
    fn set_uniform(&mut self, location: i32, value: UniformValue) -> BackendResult<()>;

    /// Bind a texture to a sampler unit
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) -> BackendResult<()>;

    /// Upload vertex and index data
    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<MeshHandle>;

    /// Upload RGBA8 image data
    fn create_texture(&mut self, image: &ImageData) -> BackendResult<TextureHandle>;

    /// Free an uploaded mesh. Unknown handles are ignored.
    fn delete_mesh(&mut self, mesh: MeshHandle);

    /// Free an uploaded texture. Unknown handles are ignored.
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Draw an uploaded mesh with the current program and state
    fn draw_mesh(&mut self, mesh: MeshHandle) -> BackendResult<()>;

    /// Downcast to concrete backend type
    fn as_any(&self) -> &dyn std::any::Any;

    /// Downcast to mutable concrete backend type
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
