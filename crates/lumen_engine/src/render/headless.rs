//! Headless recording backend
//!
//! Executes nothing on a GPU. Every state change and draw is appended to a
//! command list holding the current frame only, and each draw records the
//! blend and depth state it was issued under. Programs are "compiled" by scanning the GLSL sources for `uniform`
//! declarations (struct uniforms expand to dotted member names), so uniform
//! lookups fail exactly where a real driver would report location `-1`.

use std::any::Any;
use std::collections::HashMap;

use crate::assets::image_loader::ImageData;
use crate::foundation::math::Vec4;
use crate::render::backend::{
    BackendResult, BlendMode, ClearFlags, DepthFunc, FaceCulling, MeshHandle, ProgramHandle,
    RenderBackend, TextureHandle, UniformValue,
};
use crate::render::{RenderError, Vertex};

/// A draw call together with the pipeline state it was issued under
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    /// Mesh drawn
    pub mesh: MeshHandle,
    /// Program current at draw time
    pub program: ProgramHandle,
    /// Blend mode at draw time
    pub blend: BlendMode,
    /// Depth function at draw time
    pub depth_func: DepthFunc,
    /// Whether depth writes were enabled
    pub depth_write: bool,
}

/// Recorded backend command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Buffer clear
    Clear(ClearFlags),
    /// Clear colour change
    SetClearColor(Vec4),
    /// Culling change
    SetFaceCulling(FaceCulling),
    /// Blend change
    SetBlendMode(BlendMode),
    /// Depth write toggle
    SetDepthWrite(bool),
    /// Depth function change
    SetDepthFunc(DepthFunc),
    /// Program bind
    UseProgram(ProgramHandle),
    /// Uniform upload
    SetUniform {
        /// Location in the current program
        location: i32,
        /// Uploaded value
        value: UniformValue,
    },
    /// Texture bind
    BindTexture {
        /// Sampler unit
        unit: u32,
        /// Bound texture
        texture: TextureHandle,
    },
    /// Draw call
    Draw(DrawRecord),
}

#[derive(Debug)]
struct ProgramInfo {
    name: String,
    uniforms: HashMap<String, i32>,
}

/// Backend that records commands instead of executing them
#[derive(Debug)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    programs: HashMap<ProgramHandle, ProgramInfo>,
    meshes: HashMap<MeshHandle, usize>,
    textures: HashMap<TextureHandle, usize>,
    next_handle: u64,
    current_program: Option<ProgramHandle>,
    blend: BlendMode,
    depth_func: DepthFunc,
    depth_write: bool,
    allocated_bytes: usize,
    frames: u64,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Create an empty backend with default GL-like state
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            programs: HashMap::new(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            next_handle: 1,
            current_program: None,
            blend: BlendMode::Disabled,
            depth_func: DepthFunc::Less,
            depth_write: true,
            allocated_bytes: 0,
            frames: 0,
        }
    }

    fn allocate_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Commands recorded since the last [`RenderBackend::begin_frame`]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Recorded draws in issue order
    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.commands.iter().filter_map(|command| match command {
            Command::Draw(record) => Some(record),
            _ => None,
        })
    }

    /// Bytes held by uploaded meshes and textures
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Frames begun so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of uploaded meshes
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of uploaded textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Name of a compiled program
    pub fn program_name(&self, program: ProgramHandle) -> Option<&str> {
        self.programs.get(&program).map(|info| info.name.as_str())
    }

    /// Value last uploaded to `name` on `program`, searching the whole command log
    pub fn last_uniform(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        let location = self.uniform_location(program, name)?;
        let mut current = None;
        let mut found = None;
        for command in &self.commands {
            match command {
                Command::UseProgram(handle) => current = Some(*handle),
                Command::SetUniform { location: l, value } if current == Some(program) && *l == location => {
                    found = Some(*value);
                }
                _ => {}
            }
        }
        found
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self) {
        self.commands.clear();
        self.frames += 1;
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.commands.push(Command::Clear(flags));
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.commands.push(Command::SetClearColor(color));
    }

    fn set_face_culling(&mut self, culling: FaceCulling) {
        self.commands.push(Command::SetFaceCulling(culling));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.commands.push(Command::SetBlendMode(mode));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
        self.commands.push(Command::SetDepthWrite(enabled));
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.depth_func = func;
        self.commands.push(Command::SetDepthFunc(func));
    }

    fn compile_program(&mut self, name: &str, vertex_source: &str, fragment_source: &str)
        -> BackendResult<ProgramHandle>
    {
        for (stage, source) in [("vertex", vertex_source), ("fragment", fragment_source)] {
            if !source.contains("main") {
                return Err(RenderError::ShaderCompilation(format!(
                    "{name}: {stage} stage has no entry point"
                )));
            }
        }

        let mut uniforms = HashMap::new();
        for source in [vertex_source, fragment_source] {
            for uniform in glsl::uniform_names(source) {
                let next = i32::try_from(uniforms.len()).unwrap_or(i32::MAX);
                uniforms.entry(uniform).or_insert(next);
            }
        }

        let handle = ProgramHandle(self.allocate_handle());
        log::debug!("Compiled program '{}' with {} uniforms", name, uniforms.len());
        self.programs.insert(handle, ProgramInfo { name: name.to_string(), uniforms });
        Ok(handle)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<i32> {
        self.programs.get(&program)?.uniforms.get(name).copied()
    }

    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        if !self.programs.contains_key(&program) {
            return Err(RenderError::UnknownProgram(program));
        }
        self.current_program = Some(program);
        self.commands.push(Command::UseProgram(program));
        Ok(())
    }

    fn set_uniform(&mut self, location: i32, value: UniformValue) -> BackendResult<()> {
        let program = self.current_program.ok_or(RenderError::NoProgramBound)?;
        let known = self
            .programs
            .get(&program)
            .is_some_and(|info| info.uniforms.values().any(|l| *l == location));
        if !known {
            return Err(RenderError::BackendError(format!(
                "location {location} does not exist in program {program:?}"
            )));
        }
        self.commands.push(Command::SetUniform { location, value });
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) -> BackendResult<()> {
        if !self.textures.contains_key(&texture) {
            return Err(RenderError::UnknownTexture(texture));
        }
        self.commands.push(Command::BindTexture { unit, texture });
        Ok(())
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<MeshHandle> {
        if vertices.is_empty() {
            return Err(RenderError::BackendError("mesh has no vertices".to_string()));
        }
        let bytes = bytemuck::cast_slice::<Vertex, u8>(vertices).len()
            + bytemuck::cast_slice::<u32, u8>(indices).len();
        let handle = MeshHandle(self.allocate_handle());
        self.meshes.insert(handle, bytes);
        self.allocated_bytes += bytes;
        Ok(handle)
    }

    fn create_texture(&mut self, image: &ImageData) -> BackendResult<TextureHandle> {
        let expected = image.width as usize * image.height as usize * usize::from(image.channels);
        if image.data.len() != expected {
            return Err(RenderError::BackendError(format!(
                "texture data is {} bytes, expected {}",
                image.data.len(),
                expected
            )));
        }
        let handle = TextureHandle(self.allocate_handle());
        self.textures.insert(handle, image.data.len());
        self.allocated_bytes += image.data.len();
        Ok(handle)
    }

    fn delete_mesh(&mut self, mesh: MeshHandle) {
        match self.meshes.remove(&mesh) {
            Some(bytes) => self.allocated_bytes -= bytes,
            None => log::warn!("Deleting unknown mesh {:?}", mesh),
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        match self.textures.remove(&texture) {
            Some(bytes) => self.allocated_bytes -= bytes,
            None => log::warn!("Deleting unknown texture {:?}", texture),
        }
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) -> BackendResult<()> {
        if !self.meshes.contains_key(&mesh) {
            return Err(RenderError::UnknownMesh(mesh));
        }
        let program = self.current_program.ok_or(RenderError::NoProgramBound)?;
        self.commands.push(Command::Draw(DrawRecord {
            mesh,
            program,
            blend: self.blend,
            depth_func: self.depth_func,
            depth_write: self.depth_write,
        }));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Minimal GLSL declaration scanner
mod glsl {
    use std::collections::HashMap;

    fn tokens(source: &str) -> Vec<String> {
        let mut spaced = String::with_capacity(source.len());
        for line in source.lines() {
            let line = line.split("//").next().unwrap_or_default();
            if line.trim_start().starts_with('#') {
                continue;
            }
            for c in line.chars() {
                if matches!(c, '{' | '}' | ';') {
                    spaced.push(' ');
                    spaced.push(c);
                    spaced.push(' ');
                } else {
                    spaced.push(c);
                }
            }
            spaced.push('\n');
        }
        spaced.split_whitespace().map(str::to_string).collect()
    }

    /// Collect the tokens of one declaration up to `;`, returning `(type, name)`
    fn declaration(tokens: &[String], start: usize) -> (Option<(String, String)>, usize) {
        let mut end = start;
        while end < tokens.len() && tokens[end] != ";" {
            end += 1;
        }
        let parts = &tokens[start..end];
        let result = if parts.len() >= 2 {
            Some((parts[parts.len() - 2].clone(), parts[parts.len() - 1].clone()))
        } else {
            None
        };
        (result, end + 1)
    }

    fn expand(prefix: &str, ty: &str, structs: &HashMap<String, Vec<(String, String)>>, out: &mut Vec<String>) {
        match structs.get(ty) {
            Some(fields) => {
                for (field_ty, field_name) in fields {
                    expand(&format!("{prefix}.{field_name}"), field_ty, structs, out);
                }
            }
            None => out.push(prefix.to_string()),
        }
    }

    /// Every uniform name a program built from `source` would expose
    pub fn uniform_names(source: &str) -> Vec<String> {
        let tokens = tokens(source);
        let mut structs: HashMap<String, Vec<(String, String)>> = HashMap::new();
        let mut names = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i].as_str() {
                "struct" if i + 2 < tokens.len() && tokens[i + 2] == "{" => {
                    let name = tokens[i + 1].clone();
                    let mut fields = Vec::new();
                    i += 3;
                    while i < tokens.len() && tokens[i] != "}" {
                        let (field, next) = declaration(&tokens, i);
                        fields.extend(field);
                        i = next;
                    }
                    structs.insert(name, fields);
                    i += 1;
                }
                "uniform" => {
                    let (uniform, next) = declaration(&tokens, i + 1);
                    if let Some((ty, name)) = uniform {
                        expand(&name, &ty, &structs, &mut names);
                    }
                    i = next;
                }
                _ => i += 1,
            }
        }
        names
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_struct_uniforms_expand_to_dotted_names() {
            let source = "
                #version 330
                struct Base { vec3 color; float intensity; };
                struct Point { Base base_light; float range; };
                uniform Point point_light; // trailing comment
                uniform highp mat4 MVP;
                void main() { float x = 1.0; }
            ";
            let names = uniform_names(source);
            assert_eq!(
                names,
                vec![
                    "point_light.base_light.color",
                    "point_light.base_light.intensity",
                    "point_light.range",
                    "MVP",
                ]
            );
        }
    }
}
