//! Forward shaders
//!
//! One shader per pass kind. The ambient shader lays down depth and the base
//! colour; the three light shaders each add one light's contribution on top.
//! Every shader binds the material's diffuse texture to unit 0 when present.

use crate::foundation::math::Vec3;
use crate::render::backend::RenderBackend;
use crate::render::lighting::{ActiveLight, BaseLight, LightKind, LightParams, PointParams};
use crate::render::shader::{Shader, ShaderProgram, UniformInputs};
use crate::render::{Material, RenderError};

const GLSL_VERSION: &str = "#version 330\n";

const AMBIENT_VS: &str = include_str!("../../shaders/forward_ambient.vs");
const AMBIENT_FS: &str = include_str!("../../shaders/forward_ambient.fs");
const FORWARD_VS: &str = include_str!("../../shaders/forward.vs");
const LIGHTING: &str = include_str!("../../shaders/lighting.glh");
const DIRECTIONAL_FS: &str = include_str!("../../shaders/forward_directional.fs");
const POINT_FS: &str = include_str!("../../shaders/forward_point.fs");
const SPOT_FS: &str = include_str!("../../shaders/forward_spot.fs");

const SURFACE_UNIFORMS: [&str; 5] = ["model", "MVP", "eyePos", "specular.intensity", "specular.exponent"];

fn light_fragment(body: &str) -> String {
    format!("{GLSL_VERSION}{LIGHTING}\n{body}")
}

fn point_uniforms(prefix: &str) -> Vec<String> {
    [
        "base_light.color",
        "base_light.intensity",
        "attenuation.constant",
        "attenuation.linear",
        "attenuation.exponent",
        "position",
        "range",
    ]
    .iter()
    .map(|member| format!("{prefix}.{member}"))
    .collect()
}

fn compile_light_program(
    backend: &mut dyn RenderBackend,
    name: &str,
    fragment: &str,
    light_uniforms: &[String],
) -> Result<ShaderProgram, RenderError> {
    let mut program = ShaderProgram::compile(backend, name, FORWARD_VS, &light_fragment(fragment))?;
    program.add_uniforms(backend, &SURFACE_UNIFORMS)?;
    for uniform in light_uniforms {
        program.add_uniform(backend, uniform)?;
    }
    Ok(program)
}

fn bind_diffuse(backend: &mut dyn RenderBackend, material: &Material) -> Result<(), RenderError> {
    if let Some(texture) = material.diffuse() {
        backend.bind_texture(0, texture.handle())?;
    }
    Ok(())
}

fn upload_surface(
    program: &ShaderProgram,
    backend: &mut dyn RenderBackend,
    inputs: &UniformInputs<'_>,
) -> Result<(), RenderError> {
    let specular = inputs.material.specular();
    program.set_uniform(backend, "model", inputs.world)?;
    program.set_uniform(backend, "MVP", inputs.mvp())?;
    program.set_uniform(backend, "eyePos", inputs.eye_position)?;
    program.set_uniform(backend, "specular.intensity", specular.intensity)?;
    program.set_uniform(backend, "specular.exponent", specular.exponent)
}

fn upload_base_light(
    program: &ShaderProgram,
    backend: &mut dyn RenderBackend,
    prefix: &str,
    base: &BaseLight,
) -> Result<(), RenderError> {
    program.set_uniform(backend, &format!("{prefix}.color"), base.color)?;
    program.set_uniform(backend, &format!("{prefix}.intensity"), base.intensity)
}

fn upload_point(
    program: &ShaderProgram,
    backend: &mut dyn RenderBackend,
    prefix: &str,
    point: &PointParams,
    position: &Vec3,
) -> Result<(), RenderError> {
    upload_base_light(program, backend, &format!("{prefix}.base_light"), &point.base)?;
    program.set_uniform(backend, &format!("{prefix}.attenuation.constant"), point.attenuation.constant)?;
    program.set_uniform(backend, &format!("{prefix}.attenuation.linear"), point.attenuation.linear)?;
    program.set_uniform(backend, &format!("{prefix}.attenuation.exponent"), point.attenuation.exponent)?;
    program.set_uniform(backend, &format!("{prefix}.position"), *position)?;
    program.set_uniform(backend, &format!("{prefix}.range"), point.range)
}

fn active_light<'a>(
    inputs: &UniformInputs<'a>,
    kind: LightKind,
    shader: &'static str,
) -> Result<&'a ActiveLight, RenderError> {
    inputs
        .light
        .filter(|light| light.params.kind() == kind)
        .ok_or(RenderError::MissingActiveLight(shader))
}

/// Base pass: diffuse texture scaled by the scene's ambient light
#[derive(Debug)]
pub struct ForwardAmbient {
    program: ShaderProgram,
}

impl ForwardAmbient {
    /// Compile and register `ambient_intensity` and `MVP`
    pub fn new(backend: &mut dyn RenderBackend) -> Result<Self, RenderError> {
        let mut program = ShaderProgram::compile(backend, "forward-ambient", AMBIENT_VS, AMBIENT_FS)?;
        program.add_uniforms(backend, &["ambient_intensity", "MVP"])?;
        Ok(Self { program })
    }
}

impl Shader for ForwardAmbient {
    fn program(&self) -> &ShaderProgram {
        &self.program
    }

    fn update_uniforms(&self, backend: &mut dyn RenderBackend, inputs: &UniformInputs<'_>) -> Result<(), RenderError> {
        bind_diffuse(backend, inputs.material)?;
        self.program.set_uniform(backend, "MVP", inputs.mvp())?;
        let ambient = inputs.material.ambient_override().unwrap_or(inputs.ambient);
        self.program.set_uniform(backend, "ambient_intensity", ambient)
    }
}

/// Accumulation pass for a directional light
#[derive(Debug)]
pub struct ForwardDirectional {
    program: ShaderProgram,
}

impl ForwardDirectional {
    /// Compile and register the surface and `directional_light` uniforms
    pub fn new(backend: &mut dyn RenderBackend) -> Result<Self, RenderError> {
        let uniforms = [
            "directional_light.base_light.color".to_string(),
            "directional_light.base_light.intensity".to_string(),
            "directional_light.direction".to_string(),
        ];
        let program = compile_light_program(backend, "forward-directional", DIRECTIONAL_FS, &uniforms)?;
        Ok(Self { program })
    }
}

impl Shader for ForwardDirectional {
    fn program(&self) -> &ShaderProgram {
        &self.program
    }

    fn update_uniforms(&self, backend: &mut dyn RenderBackend, inputs: &UniformInputs<'_>) -> Result<(), RenderError> {
        let light = active_light(inputs, LightKind::Directional, "forward-directional")?;
        bind_diffuse(backend, inputs.material)?;
        upload_surface(&self.program, backend, inputs)?;
        upload_base_light(&self.program, backend, "directional_light.base_light", light.params.base())?;
        self.program.set_uniform(backend, "directional_light.direction", light.direction)
    }
}

/// Accumulation pass for a point light
#[derive(Debug)]
pub struct ForwardPoint {
    program: ShaderProgram,
}

impl ForwardPoint {
    /// Compile and register the surface and `point_light` uniforms
    pub fn new(backend: &mut dyn RenderBackend) -> Result<Self, RenderError> {
        let program = compile_light_program(backend, "forward-point", POINT_FS, &point_uniforms("point_light"))?;
        Ok(Self { program })
    }
}

impl Shader for ForwardPoint {
    fn program(&self) -> &ShaderProgram {
        &self.program
    }

    fn update_uniforms(&self, backend: &mut dyn RenderBackend, inputs: &UniformInputs<'_>) -> Result<(), RenderError> {
        let light = active_light(inputs, LightKind::Point, "forward-point")?;
        let LightParams::Point(point) = &light.params else {
            return Err(RenderError::MissingActiveLight("forward-point"));
        };
        bind_diffuse(backend, inputs.material)?;
        upload_surface(&self.program, backend, inputs)?;
        upload_point(&self.program, backend, "point_light", point, &light.position)
    }
}

/// Accumulation pass for a spot light
#[derive(Debug)]
pub struct ForwardSpot {
    program: ShaderProgram,
}

impl ForwardSpot {
    /// Compile and register the surface and `spot_light` uniforms
    pub fn new(backend: &mut dyn RenderBackend) -> Result<Self, RenderError> {
        let mut uniforms = point_uniforms("spot_light.point_light");
        uniforms.push("spot_light.direction".to_string());
        uniforms.push("spot_light.cutoff".to_string());
        let program = compile_light_program(backend, "forward-spot", SPOT_FS, &uniforms)?;
        Ok(Self { program })
    }
}

impl Shader for ForwardSpot {
    fn program(&self) -> &ShaderProgram {
        &self.program
    }

    fn update_uniforms(&self, backend: &mut dyn RenderBackend, inputs: &UniformInputs<'_>) -> Result<(), RenderError> {
        let light = active_light(inputs, LightKind::Spot, "forward-spot")?;
        let LightParams::Spot { point, cutoff } = &light.params else {
            return Err(RenderError::MissingActiveLight("forward-spot"));
        };
        bind_diffuse(backend, inputs.material)?;
        upload_surface(&self.program, backend, inputs)?;
        upload_point(&self.program, backend, "spot_light.point_light", point, &light.position)?;
        self.program.set_uniform(backend, "spot_light.direction", light.direction)?;
        self.program.set_uniform(backend, "spot_light.cutoff", *cutoff)
    }
}

/// The renderer's shader set, one instance per pass kind
#[derive(Debug)]
pub struct ShaderLibrary {
    ambient: ForwardAmbient,
    directional: ForwardDirectional,
    point: ForwardPoint,
    spot: ForwardSpot,
}

impl ShaderLibrary {
    /// Compile every forward shader
    pub fn new(backend: &mut dyn RenderBackend) -> Result<Self, RenderError> {
        let library = Self {
            ambient: ForwardAmbient::new(backend)?,
            directional: ForwardDirectional::new(backend)?,
            point: ForwardPoint::new(backend)?,
            spot: ForwardSpot::new(backend)?,
        };
        log::debug!("Compiled forward shader library");
        Ok(library)
    }

    /// Base pass shader
    pub fn ambient(&self) -> &dyn Shader {
        &self.ambient
    }

    /// Accumulation shader for a light kind
    pub fn for_light(&self, kind: LightKind) -> &dyn Shader {
        match kind {
            LightKind::Directional => &self.directional,
            LightKind::Point => &self.point,
            LightKind::Spot => &self.spot,
        }
    }
}
