//! # Multi-pass forward renderer
//!
//! Each frame draws the scene graph once with the ambient shader and then once
//! more per registered light, blending every light pass additively on top.
//!
//! ## Pass state
//!
//! | Pass | Blend | Depth write | Depth test |
//! |---|---|---|---|
//! | ambient | off | on | LESS |
//! | per light | ONE, ONE | off | EQUAL |
//!
//! The EQUAL test restricts each light pass to the fragments the ambient pass
//! left visible. The ambient state is restored after the last light pass and
//! after a failed one.

use crate::core::{LightId, RendererConfig, SharedGlobals};
use crate::foundation::math::{Mat4, QuatExt, Vec3, Vec4};
use crate::render::backend::{BlendMode, ClearFlags, DepthFunc, FaceCulling, RenderBackend};
use crate::render::forward::ShaderLibrary;
use crate::render::lighting::ActiveLight;
use crate::render::shader::{Shader, UniformInputs};
use crate::render::{Material, Mesh, RenderError};
use crate::scene::{GameObject, Scene, TransformId, Transforms};

/// One walk over the scene graph with a fixed shader
pub struct RenderPass<'a> {
    backend: &'a mut dyn RenderBackend,
    shader: &'a dyn Shader,
    transforms: &'a mut Transforms,
    view_projection: Mat4,
    eye_position: Vec3,
    ambient: Vec3,
    light: Option<&'a ActiveLight>,
    draws: usize,
}

impl<'a> RenderPass<'a> {
    /// Draw `mesh` at the world transform of `transform` with this pass's shader
    pub fn draw(&mut self, transform: TransformId, mesh: &Mesh, material: &Material) -> Result<(), RenderError> {
        let world = self.transforms.get_transformation(transform);
        let inputs = UniformInputs {
            world,
            view_projection: self.view_projection,
            eye_position: self.eye_position,
            material,
            ambient: self.ambient,
            light: self.light,
        };
        self.shader.bind(self.backend)?;
        self.shader.update_uniforms(self.backend, &inputs)?;
        self.backend.draw_mesh(mesh.handle())?;
        self.draws += 1;
        Ok(())
    }

    /// Light of this pass; `None` for the ambient pass
    pub fn light(&self) -> Option<&ActiveLight> {
        self.light
    }

    /// Draws issued so far
    pub fn draws(&self) -> usize {
        self.draws
    }
}

/// Counters of one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draws issued by the ambient pass
    pub ambient_draws: usize,
    /// Draws issued by all light passes together
    pub light_draws: usize,
    /// Lights rendered
    pub lights: usize,
    /// Passes over the graph, the ambient pass included
    pub passes: usize,
}

impl FrameStats {
    /// Every draw of the frame
    pub fn total_draws(&self) -> usize {
        self.ambient_draws + self.light_draws
    }
}

/// Forward renderer over an abstract backend
pub struct RenderingEngine {
    backend: Box<dyn RenderBackend>,
    shaders: ShaderLibrary,
}

impl std::fmt::Debug for RenderingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingEngine").field("shaders", &self.shaders).finish_non_exhaustive()
    }
}

impl RenderingEngine {
    /// Compile the shader library and put the backend into the ambient-pass state
    pub fn new(mut backend: Box<dyn RenderBackend>, config: &RendererConfig) -> Result<Self, RenderError> {
        let shaders = ShaderLibrary::new(backend.as_mut())?;

        let [r, g, b, a] = config.clear_color;
        backend.set_clear_color(Vec4::new(r, g, b, a));
        backend.set_face_culling(FaceCulling::BackClockwise);

        let mut engine = Self { backend, shaders };
        engine.opaque_state();
        log::info!("Rendering engine initialized");
        Ok(engine)
    }

    /// Blending off, depth writes on, depth test `Less`
    fn opaque_state(&mut self) {
        self.backend.set_depth_func(DepthFunc::Less);
        self.backend.set_depth_write(true);
        self.backend.set_blend_mode(BlendMode::Disabled);
    }

    /// The backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// The backend, mutably; used to upload meshes and textures
    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    /// The compiled shaders
    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    /// Render one frame: ambient pass, then one additive pass per registered light.
    ///
    /// Fails with [`RenderError::ProjectionNotConfigured`] before touching the
    /// framebuffer when there is no main camera or it has no projection.
    pub fn render(&mut self, scene: &mut Scene, globals: &mut SharedGlobals) -> Result<FrameStats, RenderError> {
        self.backend.begin_frame();
        let camera = globals.main_camera().copied().ok_or(RenderError::ProjectionNotConfigured)?;
        let (root, transforms) = scene.parts_mut();
        let view_projection = camera.view_projection(transforms)?;
        let eye_position = camera.eye_position(transforms);

        self.backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        self.opaque_state();

        let frame = FrameInputs {
            view_projection,
            eye_position,
            ambient: globals.ambient_light(),
        };
        let result = self.render_passes(root, transforms, globals, &frame);

        self.opaque_state();
        globals.set_active_light(None);

        result
    }

    fn render_passes(
        &mut self,
        root: &GameObject,
        transforms: &mut Transforms,
        globals: &mut SharedGlobals,
        frame: &FrameInputs,
    ) -> Result<FrameStats, RenderError> {
        let backend = self.backend.as_mut();
        let shaders = &self.shaders;

        let mut stats = FrameStats {
            ambient_draws: run_pass(backend, shaders.ambient(), root, transforms, frame, None)?,
            passes: 1,
            ..FrameStats::default()
        };

        backend.set_blend_mode(BlendMode::Additive);
        backend.set_depth_write(false);
        backend.set_depth_func(DepthFunc::Equal);

        for id in globals.light_ids() {
            globals.set_active_light(Some(id));
            let Some(light) = resolve_light(globals, transforms, id) else {
                continue;
            };
            let shader = shaders.for_light(light.params.kind());
            stats.light_draws += run_pass(backend, shader, root, transforms, frame, Some(&light))?;
            stats.lights += 1;
            stats.passes += 1;
        }

        log::trace!("Frame rendered: {:?}", stats);
        Ok(stats)
    }
}

struct FrameInputs {
    view_projection: Mat4,
    eye_position: Vec3,
    ambient: Vec3,
}

fn run_pass(
    backend: &mut dyn RenderBackend,
    shader: &dyn Shader,
    root: &GameObject,
    transforms: &mut Transforms,
    frame: &FrameInputs,
    light: Option<&ActiveLight>,
) -> Result<usize, RenderError> {
    let mut pass = RenderPass {
        backend,
        shader,
        transforms,
        view_projection: frame.view_projection,
        eye_position: frame.eye_position,
        ambient: frame.ambient,
        light,
        draws: 0,
    };
    root.render(&mut pass)?;
    Ok(pass.draws)
}

fn resolve_light(globals: &SharedGlobals, transforms: &mut Transforms, id: LightId) -> Option<ActiveLight> {
    let entry = *globals.light(id)?;
    Some(ActiveLight {
        params: entry.params,
        position: transforms.transformed_position(entry.transform),
        direction: transforms.transformed_rotation(entry.transform).forward(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Camera, MeshRenderer, PointLight};
    use crate::render::{Attenuation, Command, DrawRecord, MeshData, Projection, RecordingBackend};
    use crate::scene::Transform;
    use std::rc::Rc;

    fn engine() -> RenderingEngine {
        RenderingEngine::new(Box::new(RecordingBackend::new()), &RendererConfig::default()).unwrap()
    }

    fn recorder(engine: &RenderingEngine) -> &RecordingBackend {
        engine.backend().as_any().downcast_ref::<RecordingBackend>().unwrap()
    }

    fn add_camera(scene: &mut Scene, globals: &mut SharedGlobals) {
        let mut node = scene.create_object(Transform::from_translation(Vec3::new(0.0, 0.0, -10.0)));
        node.add_component(Camera::new(Projection::perspective(70.0, 1.0, 0.1, 1000.0)));
        scene.add_object(node, globals);
    }

    fn add_meshes(scene: &mut Scene, globals: &mut SharedGlobals, mesh: &Rc<Mesh>, count: usize) {
        let material = Material::new("plain").into_shared();
        for i in 0..count {
            let mut node = scene.create_object(Transform::from_translation(Vec3::new(i as f32, 0.0, 0.0)));
            node.add_component(MeshRenderer::new(Rc::clone(mesh), Rc::clone(&material)));
            scene.add_object(node, globals);
        }
    }

    fn add_point_lights(scene: &mut Scene, globals: &mut SharedGlobals, count: usize) {
        for i in 0..count {
            let mut node = scene.create_object(Transform::from_translation(Vec3::new(0.0, i as f32, 2.0)));
            node.add_component(PointLight::new(Vec3::new(1.0, 1.0, 1.0), 1.0, Attenuation::default()));
            scene.add_object(node, globals);
        }
    }

    fn is_ambient_state(draw: &DrawRecord) -> bool {
        draw.blend == BlendMode::Disabled && draw.depth_func == DepthFunc::Less && draw.depth_write
    }

    fn is_additive_state(draw: &DrawRecord) -> bool {
        draw.blend == BlendMode::Additive && draw.depth_func == DepthFunc::Equal && !draw.depth_write
    }

    #[test]
    fn test_one_ambient_and_one_additive_pass_per_light() {
        let mut engine = engine();
        let mut scene = Scene::new();
        let mut globals = SharedGlobals::new();
        let mesh = Rc::new(Mesh::upload(engine.backend_mut(), &MeshData::cube(1.0)).unwrap());
        add_camera(&mut scene, &mut globals);
        add_meshes(&mut scene, &mut globals, &mesh, 4);
        add_point_lights(&mut scene, &mut globals, 3);

        let stats = engine.render(&mut scene, &mut globals).unwrap();
        assert_eq!(
            stats,
            FrameStats {
                ambient_draws: 4,
                light_draws: 12,
                lights: 3,
                passes: 4,
            }
        );

        let draws: Vec<DrawRecord> = recorder(&engine).draws().copied().collect();
        assert_eq!(draws.len(), 16);
        assert!(draws[..4].iter().all(is_ambient_state));
        assert!(draws[4..].iter().all(is_additive_state));
    }

    #[test]
    fn test_light_passes_use_the_light_kind_shader() {
        let mut engine = engine();
        let mut scene = Scene::new();
        let mut globals = SharedGlobals::new();
        let mesh = Rc::new(Mesh::upload(engine.backend_mut(), &MeshData::plane(1.0)).unwrap());
        add_camera(&mut scene, &mut globals);
        add_meshes(&mut scene, &mut globals, &mesh, 1);
        add_point_lights(&mut scene, &mut globals, 1);

        engine.render(&mut scene, &mut globals).unwrap();

        let backend = recorder(&engine);
        let programs: Vec<&str> = backend
            .draws()
            .filter_map(|draw| backend.program_name(draw.program))
            .collect();
        assert_eq!(programs, vec!["forward-ambient", "forward-point"]);
    }

    #[test]
    fn test_mesh_with_light_sibling_renders_twice() {
        let mut engine = engine();
        let mut scene = Scene::new();
        let mut globals = SharedGlobals::new();
        let mesh = Rc::new(Mesh::upload(engine.backend_mut(), &MeshData::cube(1.0)).unwrap());
        add_camera(&mut scene, &mut globals);

        let mut mesh_node = scene.create_object(Transform::default());
        mesh_node.add_component(MeshRenderer::new(Rc::clone(&mesh), Material::new("m").into_shared()));
        let mut light_node = scene.create_object(Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        light_node.add_component(PointLight::new(Vec3::new(1.0, 0.5, 0.5), 1.0, Attenuation::default()));
        let mut group = scene.create_object(Transform::default());
        group
            .add_child(scene.transforms_mut(), mesh_node)
            .add_child(scene.transforms_mut(), light_node);
        scene.add_object(group, &mut globals);

        let stats = engine.render(&mut scene, &mut globals).unwrap();

        assert_eq!(globals.light_count(), 1);
        assert_eq!(stats.passes, 2);
        assert_eq!(stats.total_draws(), 2);
        assert!(recorder(&engine).draws().all(|draw| draw.mesh == mesh.handle()));
    }

    #[test]
    fn test_missing_camera_fails_before_clearing() {
        let mut engine = engine();
        let mut scene = Scene::new();
        let mut globals = SharedGlobals::new();

        let result = engine.render(&mut scene, &mut globals);

        assert!(matches!(result, Err(RenderError::ProjectionNotConfigured)));
        assert!(recorder(&engine).commands().is_empty());
    }

    #[test]
    fn test_state_restored_after_frame() {
        let mut engine = engine();
        let mut scene = Scene::new();
        let mut globals = SharedGlobals::new();
        let mesh = Rc::new(Mesh::upload(engine.backend_mut(), &MeshData::cube(1.0)).unwrap());
        add_camera(&mut scene, &mut globals);
        add_meshes(&mut scene, &mut globals, &mesh, 2);
        add_point_lights(&mut scene, &mut globals, 2);

        engine.render(&mut scene, &mut globals).unwrap();

        let commands = recorder(&engine).commands();
        let tail = &commands[commands.len() - 3..];
        assert_eq!(
            tail,
            &[
                Command::SetDepthFunc(DepthFunc::Less),
                Command::SetDepthWrite(true),
                Command::SetBlendMode(BlendMode::Disabled),
            ]
        );
        assert!(globals.active_light().is_none());
    }

    #[test]
    fn test_ambient_pass_resets_leftover_state() {
        let mut engine = engine();
        let mut scene = Scene::new();
        let mut globals = SharedGlobals::new();
        let mesh = Rc::new(Mesh::upload(engine.backend_mut(), &MeshData::cube(1.0)).unwrap());
        add_camera(&mut scene, &mut globals);
        add_meshes(&mut scene, &mut globals, &mesh, 2);

        let backend = engine.backend_mut();
        backend.set_blend_mode(BlendMode::Additive);
        backend.set_depth_write(false);
        backend.set_depth_func(DepthFunc::Equal);

        let stats = engine.render(&mut scene, &mut globals).unwrap();
        assert_eq!(stats.ambient_draws, 2);
        assert!(recorder(&engine).draws().all(is_ambient_state));
    }

    #[test]
    fn test_command_log_holds_only_the_last_frame() {
        let mut engine = engine();
        let mut scene = Scene::new();
        let mut globals = SharedGlobals::new();
        let mesh = Rc::new(Mesh::upload(engine.backend_mut(), &MeshData::cube(1.0)).unwrap());
        add_camera(&mut scene, &mut globals);
        add_meshes(&mut scene, &mut globals, &mesh, 3);
        add_point_lights(&mut scene, &mut globals, 1);

        engine.render(&mut scene, &mut globals).unwrap();
        let one_frame = recorder(&engine).commands().len();
        for _ in 0..20 {
            engine.render(&mut scene, &mut globals).unwrap();
        }

        assert_eq!(recorder(&engine).commands().len(), one_frame);
        assert_eq!(recorder(&engine).draws().count(), 6);
        assert_eq!(recorder(&engine).frames(), 21);
    }

    #[test]
    fn test_failed_pass_still_restores_state() {
        let mut engine = engine();
        let mut scene = Scene::new();
        let mut globals = SharedGlobals::new();
        let mut elsewhere = RecordingBackend::new();
        let foreign = Rc::new(Mesh::upload(&mut elsewhere, &MeshData::cube(1.0)).unwrap());
        add_camera(&mut scene, &mut globals);
        add_meshes(&mut scene, &mut globals, &foreign, 1);

        let result = engine.render(&mut scene, &mut globals);

        assert!(matches!(result, Err(RenderError::UnknownMesh(_))));
        let commands = recorder(&engine).commands();
        assert_eq!(commands.last(), Some(&Command::SetBlendMode(BlendMode::Disabled)));
    }
}
