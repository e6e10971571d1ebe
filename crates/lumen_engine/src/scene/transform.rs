//! Transform hierarchy
//!
//! Transforms live in a [`Transforms`] arena and refer to their parent through a
//! [`TransformId`] key, so a child never owns its parent. World matrices are
//! computed lazily: each transform caches its parent's world matrix and only
//! re-reads it when the parent reports a change.
//!
//! Change detection has two sources:
//! - the per-frame snapshot taken by [`Transforms::update`] (`has_changed`), and
//! - an arena-wide edit stamp. Setters only mark a transform as edited when a
//!   value actually differs; the mark becomes a fresh stamp the next time the
//!   chain is walked, so edits made after a matrix was cached are never missed
//!   even if they are reverted before the next snapshot, and a write that
//!   changes nothing leaves every cache in place.

use crate::foundation::math::{Mat4, Mat4Ext, Point3, Quat, QuatExt, Vec3};
use slotmap::SlotMap;

use super::SceneError;

slotmap::new_key_type! {
    /// Non-owning handle to a transform in a [`Transforms`] arena
    pub struct TransformId;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Snapshot {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

/// Local translation, rotation and scale of a scene node
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,

    previous: Option<Snapshot>,
    parent: Option<TransformId>,
    parent_matrix: Mat4,
    parent_stamp: u64,
    stamp: u64,
    edited: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
    }
}

impl Transform {
    /// Create a parentless transform
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            previous: None,
            parent: None,
            parent_matrix: Mat4::identity(),
            parent_stamp: 0,
            stamp: 0,
            edited: false,
        }
    }

    /// Create a transform with only a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Builder-style rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder-style scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local translation
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Local rotation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Parent link
    pub fn parent(&self) -> Option<TransformId> {
        self.parent
    }

    /// Set the local translation
    pub fn set_translation(&mut self, translation: Vec3) {
        if self.translation != translation {
            self.translation = translation;
            self.edited = true;
        }
    }

    /// Set the local rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.edited = true;
        }
    }

    /// Set the local scale
    pub fn set_scale(&mut self, scale: Vec3) {
        if self.scale != scale {
            self.scale = scale;
            self.edited = true;
        }
    }

    /// Rotate by `angle` radians about `axis`, applied after the current rotation
    pub fn rotate(&mut self, axis: &Vec3, angle: f32) {
        if angle == 0.0 {
            return;
        }
        let mut rotation = Quat::rotation_quaternion(axis, angle) * self.rotation;
        rotation.renormalize();
        self.set_rotation(rotation);
    }

    /// Rotation that would make this transform face `point`
    ///
    /// Returns `None` if `point` coincides with the translation.
    pub fn look_at_direction(&self, point: &Vec3, up: &Vec3) -> Option<Quat> {
        Quat::look_rotation(&(point - self.translation), up)
    }

    /// Face `point`; leaves the rotation untouched when `point` coincides with
    /// the translation
    pub fn look_at(&mut self, point: &Vec3, up: &Vec3) {
        if let Some(rotation) = self.look_at_direction(point, up) {
            self.set_rotation(rotation);
        }
    }

    /// `T * R * S` without the parent
    pub fn local_matrix(&self) -> Mat4 {
        <Mat4 as Mat4Ext>::trs(&self.translation, &self.rotation, &self.scale)
    }

    fn current(&self) -> Snapshot {
        Snapshot {
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    fn differs_from_snapshot(&self) -> bool {
        self.previous.map_or(true, |previous| previous != self.current())
    }
}

/// Arena owning every transform of a scene
#[derive(Debug, Default)]
pub struct Transforms {
    slots: SlotMap<TransformId, Transform>,
    next_stamp: u64,
    refreshes: u64,
}

impl Transforms {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    /// Store a transform and return its handle
    pub fn insert(&mut self, mut transform: Transform) -> TransformId {
        transform.stamp = self.bump();
        transform.parent_stamp = 0;
        transform.edited = false;
        self.slots.insert(transform)
    }

    /// Free a slot. Children that still point at it behave as parentless.
    pub fn remove(&mut self, id: TransformId) -> Option<Transform> {
        self.slots.remove(id)
    }

    /// Number of live transforms
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `id` refers to a live transform
    pub fn contains(&self, id: TransformId) -> bool {
        self.slots.contains_key(id)
    }

    /// Read access
    pub fn get(&self, id: TransformId) -> Option<&Transform> {
        self.slots.get(id)
    }

    /// Write access. Only setters that change a value count as an edit.
    pub fn get_mut(&mut self, id: TransformId) -> Option<&mut Transform> {
        self.slots.get_mut(id)
    }

    /// How many times a cached parent matrix was recomputed
    pub fn cache_refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Re-parent `id`. Fails on unknown handles or if `parent` is a descendant
    /// of `id`.
    pub fn set_parent(&mut self, id: TransformId, parent: Option<TransformId>) -> Result<(), SceneError> {
        if !self.contains(id) {
            return Err(SceneError::UnknownTransform);
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(SceneError::UnknownTransform);
            }
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == id {
                    return Err(SceneError::ParentCycle);
                }
                cursor = self.slots.get(current).and_then(|t| t.parent);
            }
        }
        self.link(id, parent);
        Ok(())
    }

    /// Parent link used by the scene graph, where ownership already rules out cycles
    pub(crate) fn link(&mut self, id: TransformId, parent: Option<TransformId>) {
        let stamp = self.bump();
        if let Some(transform) = self.slots.get_mut(id) {
            transform.parent = parent;
            transform.parent_stamp = 0;
            transform.stamp = stamp;
        }
    }

    /// Whether `id` or any ancestor changed since the last [`Transforms::update`].
    ///
    /// A transform that was never snapshotted reports a change.
    pub fn has_changed(&self, id: TransformId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(transform) = self.slots.get(current) else {
                return false;
            };
            if transform.differs_from_snapshot() {
                return true;
            }
            cursor = transform.parent;
        }
        false
    }

    /// Snapshot the current values of `id` for the next frame's comparison
    pub fn update(&mut self, id: TransformId) {
        if let Some(transform) = self.slots.get_mut(id) {
            transform.previous = Some(transform.current());
        }
    }

    /// Newest edit stamp on the path from `id` to the root, stamping pending
    /// edits on the way
    fn chain_stamp(&mut self, id: TransformId) -> u64 {
        let Self { slots, next_stamp, .. } = self;
        let mut newest = 0;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(transform) = slots.get_mut(current) else {
                break;
            };
            if transform.edited {
                *next_stamp += 1;
                transform.stamp = *next_stamp;
                transform.edited = false;
            }
            newest = newest.max(transform.stamp);
            cursor = transform.parent;
        }
        newest
    }

    /// World matrix of the parent of `id`, refreshing the cache when stale
    fn parent_matrix(&mut self, id: TransformId) -> Mat4 {
        let Some(parent) = self.slots.get(id).and_then(|t| t.parent) else {
            return Mat4::identity();
        };
        if !self.slots.contains_key(parent) {
            return Mat4::identity();
        }

        let chain = self.chain_stamp(parent);
        let cached = self.slots.get(id).map_or(0, |t| t.parent_stamp);
        if cached != chain {
            let matrix = self.get_transformation(parent);
            self.refreshes += 1;
            if let Some(transform) = self.slots.get_mut(id) {
                transform.parent_matrix = matrix;
                transform.parent_stamp = chain;
            }
        }
        self.slots.get(id).map_or_else(Mat4::identity, |t| t.parent_matrix)
    }

    /// World matrix: `parent_matrix * T * R * S`.
    ///
    /// Unknown handles yield identity.
    pub fn get_transformation(&mut self, id: TransformId) -> Mat4 {
        let Some(local) = self.slots.get(id).map(Transform::local_matrix) else {
            return Mat4::identity();
        };
        self.parent_matrix(id) * local
    }

    /// World-space position of `id`
    pub fn transformed_position(&mut self, id: TransformId) -> Vec3 {
        let Some(translation) = self.slots.get(id).map(Transform::translation) else {
            return Vec3::zeros();
        };
        self.parent_matrix(id)
            .transform_point(&Point3::from(translation))
            .coords
    }

    /// `world` expressed in the frame of `id`'s parent, i.e. the local
    /// translation that would put `id` at `world`
    pub fn parent_space_point(&mut self, id: TransformId, world: Vec3) -> Vec3 {
        let parent = self.parent_matrix(id);
        if parent == Mat4::identity() {
            return world;
        }
        <Mat4 as Mat4Ext>::inverse_or_identity(&parent)
            .transform_point(&Point3::from(world))
            .coords
    }

    /// World-space rotation of `id`
    pub fn transformed_rotation(&self, id: TransformId) -> Quat {
        let mut rotation = Quat::identity();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(transform) = self.slots.get(current) else {
                break;
            };
            rotation = transform.rotation * rotation;
            cursor = transform.parent;
        }
        rotation
    }

    /// Iterate over all transforms
    pub fn iter(&self) -> impl Iterator<Item = (TransformId, &Transform)> {
        self.slots.iter()
    }
}
