//! Shared registry
//!
//! State that components publish for the renderer and for each other: the
//! registered lights, the active-light slot, the main camera, the ambient
//! light, the window size, the physics world and the hit ledger. The engine
//! owns one instance and threads it through every traversal by `&mut`.

use slotmap::SlotMap;

use crate::foundation::math::Vec3;
use crate::physics::{BodyHandle, PhysicsWorld};
use crate::render::{LightParams, MainCamera};
use crate::scene::TransformId;

slotmap::new_key_type! {
    /// Handle to a registered light
    pub struct LightId;
}

/// A light as registered by its component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEntry {
    /// Light parameters
    pub params: LightParams,
    /// Node whose world position and forward axis place the light
    pub transform: TransformId,
}

/// Registry shared by components and the renderer
pub struct SharedGlobals {
    lights: SlotMap<LightId, LightEntry>,
    active_light: Option<LightId>,
    main_camera: Option<MainCamera>,
    ambient_light: Vec3,
    window_size: (u32, u32),
    resized: bool,
    physics: Option<Box<dyn PhysicsWorld>>,
    pending_hits: Vec<BodyHandle>,
    delivered_hits: Vec<BodyHandle>,
}

impl std::fmt::Debug for SharedGlobals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedGlobals")
            .field("lights", &self.lights.len())
            .field("active_light", &self.active_light)
            .field("main_camera", &self.main_camera)
            .field("ambient_light", &self.ambient_light)
            .field("window_size", &self.window_size)
            .field("physics", &self.physics.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for SharedGlobals {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedGlobals {
    /// Empty registry with a 0.2 grey ambient light
    pub fn new() -> Self {
        Self {
            lights: SlotMap::with_key(),
            active_light: None,
            main_camera: None,
            ambient_light: Vec3::repeat(0.2),
            window_size: (0, 0),
            resized: false,
            physics: None,
            pending_hits: Vec::new(),
            delivered_hits: Vec::new(),
        }
    }

    /// Register a light
    pub fn register_light(&mut self, entry: LightEntry) -> LightId {
        let id = self.lights.insert(entry);
        log::debug!("Registered {:?} light {:?} ({} total)", entry.params.kind(), id, self.lights.len());
        id
    }

    /// Unregister a light, clearing the active slot if it pointed at it
    pub fn unregister_light(&mut self, id: LightId) -> Option<LightEntry> {
        if self.active_light == Some(id) {
            self.active_light = None;
        }
        let removed = self.lights.remove(id);
        if removed.is_some() {
            log::debug!("Unregistered light {:?} ({} left)", id, self.lights.len());
        }
        removed
    }

    /// A registered light
    pub fn light(&self, id: LightId) -> Option<&LightEntry> {
        self.lights.get(id)
    }

    /// Mutable access to a registered light
    pub fn light_mut(&mut self, id: LightId) -> Option<&mut LightEntry> {
        self.lights.get_mut(id)
    }

    /// Handles of every registered light
    pub fn light_ids(&self) -> Vec<LightId> {
        self.lights.keys().collect()
    }

    /// Number of registered lights
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Drop every registered light
    pub fn clear_lights(&mut self) {
        self.lights.clear();
        self.active_light = None;
    }

    /// Point the active-light slot at `id`
    pub fn set_active_light(&mut self, id: Option<LightId>) {
        self.active_light = id;
    }

    /// Light of the pass currently being rendered
    pub fn active_light(&self) -> Option<LightId> {
        self.active_light
    }

    /// Publish or clear the main camera
    pub fn set_main_camera(&mut self, camera: Option<MainCamera>) {
        self.main_camera = camera;
    }

    /// The scene's viewpoint
    pub fn main_camera(&self) -> Option<&MainCamera> {
        self.main_camera.as_ref()
    }

    /// Mutable access to the main camera
    pub fn main_camera_mut(&mut self) -> Option<&mut MainCamera> {
        self.main_camera.as_mut()
    }

    /// Ambient light colour
    pub fn ambient_light(&self) -> Vec3 {
        self.ambient_light
    }

    /// Replace the ambient light colour
    pub fn set_ambient_light(&mut self, ambient: Vec3) {
        self.ambient_light = ambient;
    }

    /// Current framebuffer size
    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Record a new framebuffer size; flags a resize when it changed
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        if self.window_size != (width, height) {
            self.window_size = (width, height);
            self.resized = true;
        }
    }

    /// Whether the window was resized since the flag was last cleared
    pub fn was_resized(&self) -> bool {
        self.resized
    }

    /// Clear the resize flag
    pub fn clear_resized(&mut self) {
        self.resized = false;
    }

    /// Width divided by height; 1 before the size is known
    pub fn aspect_ratio(&self) -> f32 {
        match self.window_size {
            (_, 0) => 1.0,
            (width, height) => width as f32 / height as f32,
        }
    }

    /// Install the physics world
    pub fn set_physics(&mut self, physics: Box<dyn PhysicsWorld>) {
        self.physics = Some(physics);
    }

    /// Remove the physics world
    pub fn take_physics(&mut self) -> Option<Box<dyn PhysicsWorld>> {
        self.physics.take()
    }

    /// The physics world, if installed
    pub fn physics(&self) -> Option<&dyn PhysicsWorld> {
        self.physics.as_deref()
    }

    /// Mutable physics world, if installed
    pub fn physics_mut(&mut self) -> Option<&mut (dyn PhysicsWorld + 'static)> {
        self.physics.as_deref_mut()
    }

    /// Record a hit on `body`; visible through [`SharedGlobals::hits_for`] after the next delivery
    pub fn report_hit(&mut self, body: BodyHandle) {
        self.pending_hits.push(body);
    }

    /// Hits delivered to `body` this tick
    pub fn hits_for(&self, body: BodyHandle) -> usize {
        self.delivered_hits.iter().filter(|hit| **hit == body).count()
    }

    /// End-of-tick hand-over: reports of this tick become the next tick's deliveries
    pub fn deliver_hits(&mut self) {
        self.delivered_hits.clear();
        std::mem::swap(&mut self.pending_hits, &mut self.delivered_hits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{SimpleWorld, SphereBody};
    use crate::render::{BaseLight, LightKind};
    use crate::scene::{Transform, Transforms};

    fn directional(transforms: &mut Transforms) -> LightEntry {
        LightEntry {
            params: LightParams::Directional {
                base: BaseLight::new(Vec3::repeat(1.0), 0.4),
            },
            transform: transforms.insert(Transform::default()),
        }
    }

    #[test]
    fn test_light_registration() {
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();
        let a = globals.register_light(directional(&mut transforms));
        let b = globals.register_light(directional(&mut transforms));

        assert_eq!(globals.light_ids(), vec![a, b]);
        globals.set_active_light(Some(a));
        assert_eq!(globals.unregister_light(a).map(|e| e.params.kind()), Some(LightKind::Directional));
        assert_eq!(globals.active_light(), None);
        assert_eq!(globals.light_count(), 1);
    }

    #[test]
    fn test_hits_arrive_one_tick_later() {
        let mut world = SimpleWorld::new();
        let body = world.add_body(SphereBody::new(1.0, 1.0));
        let mut globals = SharedGlobals::new();

        globals.report_hit(body);
        globals.report_hit(body);
        assert_eq!(globals.hits_for(body), 0);

        globals.deliver_hits();
        assert_eq!(globals.hits_for(body), 2);

        globals.deliver_hits();
        assert_eq!(globals.hits_for(body), 0);
    }

    #[test]
    fn test_resize_flag() {
        let mut globals = SharedGlobals::new();
        globals.set_window_size(800, 400);
        assert!(globals.was_resized());
        assert_eq!(globals.aspect_ratio(), 2.0);

        globals.clear_resized();
        globals.set_window_size(800, 400);
        assert!(!globals.was_resized());
    }
}
