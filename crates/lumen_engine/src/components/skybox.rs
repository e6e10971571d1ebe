//! Camera-centred sky

use std::any::Any;
use std::rc::Rc;

use crate::core::FrameContext;
use crate::foundation::math::{utils, Vec3};
use crate::render::material::AMBIENT_OVERRIDE;
use crate::render::{Material, MeshData, Specular, Texture};
use crate::scene::{GameComponent, TransformId};

/// Keeps its node centred on the main camera and spins it slowly.
///
/// Pair it with a [`MeshRenderer`](crate::components::MeshRenderer) drawing
/// [`Skybox::mesh_data`] with [`Skybox::material`], which is fully lit in the
/// ambient pass whatever the scene ambient is.
#[derive(Debug, Clone)]
pub struct Skybox {
    transform: Option<TransformId>,
    rotate_speed: Vec3,
}

impl Skybox {
    /// Spin about X, Y and Z at `rotate_speed` degrees per second
    pub fn new(rotate_speed: Vec3) -> Self {
        Self {
            transform: None,
            rotate_speed,
        }
    }

    /// Inward-facing cube `size` units across
    pub fn mesh_data(size: f32) -> MeshData {
        MeshData::cube(size).inverted()
    }

    /// Unlit, non-shiny material showing `texture`
    pub fn material(texture: Rc<Texture>) -> Material {
        Material::textured("skybox", texture, Specular { intensity: 0.0, exponent: 0.0 })
            .with_property(AMBIENT_OVERRIDE, Vec3::repeat(1.0))
    }
}

impl Default for Skybox {
    fn default() -> Self {
        Self::new(Vec3::repeat(1.0))
    }
}

impl GameComponent for Skybox {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, delta: f32) {
        let Some(own) = self.transform else {
            return;
        };
        let eye = ctx
            .globals
            .main_camera()
            .map(|camera| camera.transform)
            .filter(|camera| ctx.transforms.contains(*camera));
        let centre = eye.map(|camera| {
            let world = ctx.transforms.transformed_position(camera);
            ctx.transforms.parent_space_point(own, world)
        });

        let Some(transform) = ctx.transforms.get_mut(own) else {
            return;
        };
        for (axis, speed) in [(Vec3::x(), self.rotate_speed.x), (Vec3::y(), self.rotate_speed.y), (Vec3::z(), self.rotate_speed.z)] {
            transform.rotate(&axis, utils::deg_to_rad(speed * delta));
        }
        if let Some(centre) = centre {
            transform.set_translation(centre);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SharedGlobals;
    use crate::foundation::math::constants::HALF_PI;
    use crate::foundation::time::Timer;
    use crate::input::Input;
    use crate::render::MainCamera;
    use crate::scene::{Transform, Transforms};
    use approx::assert_relative_eq;

    fn run(skybox: &mut Skybox, transforms: &mut Transforms, globals: &mut SharedGlobals, delta: f32) {
        let input = Input::new();
        let timer = Timer::new();
        let mut ctx = FrameContext::new(&input, &timer, globals, transforms);
        skybox.update(&mut ctx, delta);
    }

    #[test]
    fn test_centres_on_main_camera() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let camera = transforms.insert(Transform::from_translation(Vec3::new(4.0, -2.0, 9.0)));
        globals.set_main_camera(Some(MainCamera { transform: camera, projection: None }));
        let own = transforms.insert(Transform::default());
        let mut skybox = Skybox::new(Vec3::zeros());
        skybox.attach(own);

        run(&mut skybox, &mut transforms, &mut globals, 0.016);
        assert_relative_eq!(transforms.transformed_position(own), Vec3::new(4.0, -2.0, 9.0));

        transforms.get_mut(camera).unwrap().set_translation(Vec3::new(-1.0, 0.0, 0.0));
        run(&mut skybox, &mut transforms, &mut globals, 0.016);
        assert_relative_eq!(transforms.transformed_position(own), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_spins_at_degrees_per_second() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let own = transforms.insert(Transform::default());
        let mut skybox = Skybox::new(Vec3::new(0.0, 45.0, 0.0));
        skybox.attach(own);

        run(&mut skybox, &mut transforms, &mut globals, 2.0);

        let rotation = transforms.get(own).unwrap().rotation();
        assert_relative_eq!(rotation.angle(), HALF_PI, epsilon = 1.0e-5);
        assert_eq!(transforms.get(own).unwrap().translation(), Vec3::zeros());
    }

    #[test]
    fn test_material_is_self_lit() {
        let mut backend = crate::render::RecordingBackend::new();
        let texture = Rc::new(Texture::solid(&mut backend, [90, 140, 220, 255]).unwrap());
        let material = Skybox::material(texture);

        assert_eq!(material.ambient_override(), Some(Vec3::repeat(1.0)));
        assert_eq!(material.specular(), Specular { intensity: 0.0, exponent: 0.0 });
        assert!(material.diffuse().is_some());
    }
}
