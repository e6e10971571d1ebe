//! Shader programs and the per-draw uniform hook
//!
//! A [`ShaderProgram`] owns a compiled program and the locations of the
//! uniforms registered on it. Registration is strict: a name the compiled
//! program does not declare is rejected at construction time, and uploads to
//! names that were never registered are rejected at draw time.

use std::collections::HashMap;

use crate::foundation::math::{Mat4, Vec3};
use crate::render::backend::{ProgramHandle, RenderBackend, UniformValue};
use crate::render::{ActiveLight, Material, RenderError};

/// Compiled program plus its registered uniform locations
#[derive(Debug)]
pub struct ShaderProgram {
    name: String,
    handle: ProgramHandle,
    uniforms: HashMap<String, i32>,
}

impl ShaderProgram {
    /// Compile a program from vertex and fragment source
    pub fn compile(
        backend: &mut dyn RenderBackend,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, RenderError> {
        let handle = backend.compile_program(name, vertex_source, fragment_source)?;
        Ok(Self {
            name: name.to_string(),
            handle,
            uniforms: HashMap::new(),
        })
    }

    /// Register a uniform.
    ///
    /// Fails with [`RenderError::UniformNotFound`] if the compiled program
    /// does not declare `name`.
    pub fn add_uniform(&mut self, backend: &dyn RenderBackend, name: &str) -> Result<(), RenderError> {
        let location = backend
            .uniform_location(self.handle, name)
            .ok_or_else(|| RenderError::UniformNotFound {
                program: self.name.clone(),
                name: name.to_string(),
            })?;
        self.uniforms.insert(name.to_string(), location);
        Ok(())
    }

    /// Register several uniforms, stopping at the first failure
    pub fn add_uniforms(&mut self, backend: &dyn RenderBackend, names: &[&str]) -> Result<(), RenderError> {
        names.iter().try_for_each(|name| self.add_uniform(backend, name))
    }

    /// Upload a value to a registered uniform of the currently bound program
    pub fn set_uniform(
        &self,
        backend: &mut dyn RenderBackend,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), RenderError> {
        let location = *self
            .uniforms
            .get(name)
            .ok_or_else(|| RenderError::UniformNotRegistered {
                program: self.name.clone(),
                name: name.to_string(),
            })?;
        backend.set_uniform(location, value.into())
    }

    /// Make this program current
    pub fn bind(&self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        backend.use_program(self.handle)
    }

    /// Program name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend handle
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Whether `name` has been registered
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }
}

/// Everything a shader may read while uploading uniforms for one draw
#[derive(Debug, Clone, Copy)]
pub struct UniformInputs<'a> {
    /// Object-to-world matrix
    pub world: Mat4,
    /// Camera view-projection
    pub view_projection: Mat4,
    /// World-space camera position
    pub eye_position: Vec3,
    /// Material of the drawn object
    pub material: &'a Material,
    /// Scene ambient light
    pub ambient: Vec3,
    /// Light of the current accumulation pass; `None` in the ambient pass
    pub light: Option<&'a ActiveLight>,
}

impl UniformInputs<'_> {
    /// `view_projection * world`
    pub fn mvp(&self) -> Mat4 {
        self.view_projection * self.world
    }
}

/// Shader used by one rendering pass
pub trait Shader {
    /// Underlying program
    fn program(&self) -> &ShaderProgram;

    /// Make the program current
    fn bind(&self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        self.program().bind(backend)
    }

    /// Per-draw hook: bind the material's textures and upload this shader's uniforms
    fn update_uniforms(&self, backend: &mut dyn RenderBackend, inputs: &UniformInputs<'_>) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;

    const VS: &str = "uniform mat4 MVP; void main() {}";
    const FS: &str = "uniform float level; void main() {}";

    #[test]
    fn test_add_uniform_rejects_undeclared_name() {
        let mut backend = RecordingBackend::new();
        let mut program = ShaderProgram::compile(&mut backend, "scratch", VS, FS).unwrap();

        program.add_uniform(&backend, "MVP").unwrap();
        let err = program.add_uniform(&backend, "does_not_exist").unwrap_err();
        assert!(matches!(err, RenderError::UniformNotFound { ref name, .. } if name == "does_not_exist"));
    }

    #[test]
    fn test_set_uniform_requires_registration() {
        let mut backend = RecordingBackend::new();
        let mut program = ShaderProgram::compile(&mut backend, "scratch", VS, FS).unwrap();
        program.bind(&mut backend).unwrap();

        let err = program.set_uniform(&mut backend, "level", 1.0_f32).unwrap_err();
        assert!(matches!(err, RenderError::UniformNotRegistered { .. }));

        program.add_uniform(&backend, "level").unwrap();
        program.set_uniform(&mut backend, "level", 1.0_f32).unwrap();
        assert_eq!(
            backend.last_uniform(program.handle(), "level"),
            Some(UniformValue::Float(1.0))
        );
    }
}
