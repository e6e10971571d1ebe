//! Light components
//!
//! Each light registers a [`LightEntry`] with the shared registry the first
//! time its subtree is added to the rendering engine and unregisters it on
//! removal. Adding the same light twice keeps a single registration.

use std::any::Any;

use crate::core::{LightEntry, LightId, SharedGlobals};
use crate::foundation::math::Vec3;
use crate::render::{Attenuation, BaseLight, LightError, LightParams, PointParams};
use crate::scene::{GameComponent, TransformId, Transforms};

#[derive(Debug, Default)]
struct Registration {
    transform: Option<TransformId>,
    id: Option<LightId>,
}

impl Registration {
    fn register(&mut self, globals: &mut SharedGlobals, params: LightParams) {
        if self.id.is_some() {
            return;
        }
        let Some(transform) = self.transform else {
            log::warn!("Detached {:?} light was not registered", params.kind());
            return;
        };
        self.id = Some(globals.register_light(LightEntry { params, transform }));
    }

    fn unregister(&mut self, globals: &mut SharedGlobals) {
        if let Some(id) = self.id.take() {
            globals.unregister_light(id);
        }
    }

    fn refresh(&self, globals: &mut SharedGlobals, params: LightParams) {
        if let Some(entry) = self.id.and_then(|id| globals.light_mut(id)) {
            entry.params = params;
        }
    }
}

macro_rules! light_component {
    ($light:ty) => {
        impl GameComponent for $light {
            fn attach(&mut self, transform: TransformId) {
                self.registration.transform = Some(transform);
            }

            fn transform(&self) -> Option<TransformId> {
                self.registration.transform
            }

            fn add_to_rendering_engine(&mut self, globals: &mut SharedGlobals, _transforms: &mut Transforms) {
                let params = self.params();
                self.registration.register(globals, params);
            }

            fn remove_from_rendering_engine(&mut self, globals: &mut SharedGlobals) {
                self.registration.unregister(globals);
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        impl $light {
            /// Registry handle, once registered
            pub fn light_id(&self) -> Option<LightId> {
                self.registration.id
            }

            /// Change the intensity, updating the registered entry if any
            pub fn set_intensity(&mut self, globals: &mut SharedGlobals, intensity: f32) {
                self.apply_intensity(intensity);
                let params = self.params();
                self.registration.refresh(globals, params);
            }
        }
    };
}

/// Light with parallel rays along its node's forward axis
#[derive(Debug)]
pub struct DirectionalLight {
    registration: Registration,
    base: BaseLight,
}

impl DirectionalLight {
    /// Create a directional light
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self {
            registration: Registration::default(),
            base: BaseLight::new(color, intensity),
        }
    }

    /// Parameters as registered
    pub fn params(&self) -> LightParams {
        LightParams::Directional { base: self.base }
    }

    fn apply_intensity(&mut self, intensity: f32) {
        self.base.intensity = intensity;
    }
}

/// Light radiating from its node's world position
#[derive(Debug)]
pub struct PointLight {
    registration: Registration,
    point: PointParams,
}

impl PointLight {
    /// Create a point light; the range is derived from the falloff
    pub fn new(color: Vec3, intensity: f32, attenuation: Attenuation) -> Self {
        Self {
            registration: Registration::default(),
            point: PointParams::new(BaseLight::new(color, intensity), attenuation),
        }
    }

    /// Create a point light from `#rgb` or `#rrggbb`
    pub fn from_hex(hex: &str, intensity: f32, attenuation: Attenuation) -> Result<Self, LightError> {
        let base = BaseLight::from_hex(hex, intensity)?;
        Ok(Self {
            registration: Registration::default(),
            point: PointParams::new(base, attenuation),
        })
    }

    /// Parameters as registered
    pub fn params(&self) -> LightParams {
        LightParams::Point(self.point)
    }

    /// Distance beyond which the light is ignored
    pub fn range(&self) -> f32 {
        self.point.range
    }

    fn apply_intensity(&mut self, intensity: f32) {
        let base = BaseLight { intensity, ..self.point.base };
        self.point = PointParams::new(base, self.point.attenuation);
    }
}

/// Cone of light along its node's forward axis
#[derive(Debug)]
pub struct SpotLight {
    registration: Registration,
    point: PointParams,
    cutoff: f32,
}

impl SpotLight {
    /// Create a spot light
    ///
    /// # Arguments
    /// * `cutoff` - Cosine of the cone half-angle
    pub fn new(color: Vec3, intensity: f32, attenuation: Attenuation, cutoff: f32) -> Self {
        Self {
            registration: Registration::default(),
            point: PointParams::new(BaseLight::new(color, intensity), attenuation),
            cutoff,
        }
    }

    /// Parameters as registered
    pub fn params(&self) -> LightParams {
        LightParams::Spot {
            point: self.point,
            cutoff: self.cutoff,
        }
    }

    fn apply_intensity(&mut self, intensity: f32) {
        let base = BaseLight { intensity, ..self.point.base };
        self.point = PointParams::new(base, self.point.attenuation);
    }
}

light_component!(DirectionalLight);
light_component!(PointLight);
light_component!(SpotLight);
