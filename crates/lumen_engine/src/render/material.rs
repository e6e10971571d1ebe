//! Material system for rendering
//!
//! A material is an untyped bag of named properties. Shaders pull the names
//! they understand; everything else is ignored. The names the forward shaders
//! agree on are [`DIFFUSE`], [`SPECULAR`] and [`AMBIENT_OVERRIDE`].

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::foundation::math::Vec3;
use crate::render::Texture;

/// Property holding the diffuse `Rc<Texture>`
pub const DIFFUSE: &str = "diffuse";

/// Property holding the [`Specular`] parameters
pub const SPECULAR: &str = "specular";

/// Property holding a `Vec3` that replaces the scene ambient light in the
/// ambient pass, for self-lit surfaces such as skyboxes
pub const AMBIENT_OVERRIDE: &str = "ambient_override";

/// Material shared between a renderer and whatever mutates it at runtime
pub type SharedMaterial = Rc<RefCell<Material>>;

/// Specular highlight parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Specular {
    /// Highlight strength
    pub intensity: f32,
    /// Highlight exponent
    pub exponent: f32,
}

impl Default for Specular {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            exponent: 8.0,
        }
    }
}

/// Named property bag
#[derive(Clone, Default)]
pub struct Material {
    name: String,
    properties: HashMap<String, Rc<dyn Any>>,
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.properties.keys().collect();
        keys.sort();
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("properties", &keys)
            .finish()
    }
}

impl Material {
    /// Create an empty material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Material with a diffuse texture and specular parameters
    pub fn textured(name: impl Into<String>, diffuse: Rc<Texture>, specular: Specular) -> Self {
        Self::new(name)
            .with_property(DIFFUSE, diffuse)
            .with_property(SPECULAR, specular)
    }

    /// Set a property, builder style
    pub fn with_property<T: Any>(mut self, key: &str, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Set or replace a property
    pub fn set<T: Any>(&mut self, key: &str, value: T) -> &mut Self {
        self.properties.insert(key.to_string(), Rc::new(value));
        self
    }

    /// Typed property access; `None` if absent or of another type
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.properties.get(key)?.downcast_ref::<T>()
    }

    /// Whether a property exists, whatever its type
    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Remove a property
    pub fn remove(&mut self, key: &str) -> bool {
        self.properties.remove(key).is_some()
    }

    /// Material name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Diffuse texture, if set
    pub fn diffuse(&self) -> Option<&Texture> {
        self.get::<Rc<Texture>>(DIFFUSE).map(Rc::as_ref)
    }

    /// Specular parameters, or the defaults
    pub fn specular(&self) -> Specular {
        self.get::<Specular>(SPECULAR).copied().unwrap_or_default()
    }

    /// Ambient light this material is drawn with instead of the scene's
    pub fn ambient_override(&self) -> Option<Vec3> {
        self.get::<Vec3>(AMBIENT_OVERRIDE).copied()
    }

    /// Wrap for sharing
    pub fn into_shared(self) -> SharedMaterial {
        Rc::new(RefCell::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Glow(f32);

    #[test]
    fn test_typed_access() {
        let material = Material::new("m").with_property("glow", Glow(0.5));

        assert_eq!(material.get::<Glow>("glow"), Some(&Glow(0.5)));
        assert!(material.get::<f32>("glow").is_none());
        assert!(material.get::<Glow>("missing").is_none());
    }

    #[test]
    fn test_specular_defaults_when_absent() {
        let material = Material::new("m");
        assert_eq!(material.specular(), Specular::default());

        let material = material.with_property(SPECULAR, Specular { intensity: 2.0, exponent: 32.0 });
        assert_eq!(material.specular().exponent, 32.0);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut material = Material::new("m");
        material.set("level", 1_u32).set("level", 2_u32);
        assert_eq!(material.get::<u32>("level"), Some(&2));
        assert!(material.remove("level"));
        assert!(!material.contains("level"));
    }
}
