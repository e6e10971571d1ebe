//! Mesh drawing component

use std::any::Any;
use std::rc::Rc;

use crate::render::{Mesh, RenderError, RenderPass, SharedMaterial};
use crate::scene::{GameComponent, TransformId};

/// Draws one mesh with one material at its node's world transform
#[derive(Debug)]
pub struct MeshRenderer {
    transform: Option<TransformId>,
    mesh: Rc<Mesh>,
    material: SharedMaterial,
}

impl MeshRenderer {
    /// Create a renderer sharing `mesh` and `material`
    pub fn new(mesh: Rc<Mesh>, material: SharedMaterial) -> Self {
        Self {
            transform: None,
            mesh,
            material,
        }
    }

    /// The mesh
    pub fn mesh(&self) -> &Rc<Mesh> {
        &self.mesh
    }

    /// The material; mutations show up in the next pass
    pub fn material(&self) -> &SharedMaterial {
        &self.material
    }
}

impl GameComponent for MeshRenderer {
    fn attach(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn render(&self, pass: &mut RenderPass<'_>) -> Result<(), RenderError> {
        let transform = self.transform.ok_or(RenderError::ComponentDetached("MeshRenderer"))?;
        let material = self.material.borrow();
        pass.draw(transform, &self.mesh, &material)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
