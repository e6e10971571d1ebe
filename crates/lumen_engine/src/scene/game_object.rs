//! Scene-graph nodes
//!
//! A [`GameObject`] owns one transform slot, its components and its children.
//! Ownership is a tree, so dropping a node drops its whole subtree exactly
//! once. Every traversal visits the node's components in insertion order and
//! then its children in insertion order.

use crate::core::{FrameContext, SharedGlobals};
use crate::render::{RenderError, RenderPass};
use crate::scene::{GameComponent, Transform, TransformId, Transforms};

/// Counts released by [`GameObject::despawn`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Teardown {
    /// Nodes dropped, the despawned node included
    pub objects: usize,
    /// Components dropped
    pub components: usize,
}

impl std::ops::AddAssign for Teardown {
    fn add_assign(&mut self, other: Self) {
        self.objects += other.objects;
        self.components += other.components;
    }
}

/// A node of the scene graph
pub struct GameObject {
    transform: TransformId,
    components: Vec<Box<dyn GameComponent>>,
    children: Vec<GameObject>,
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameObject")
            .field("transform", &self.transform)
            .field("components", &self.components.len())
            .field("children", &self.children)
            .finish()
    }
}

impl GameObject {
    /// Node with an identity transform
    pub fn new(transforms: &mut Transforms) -> Self {
        Self::with_transform(transforms, Transform::default())
    }

    /// Node owning `transform`
    pub fn with_transform(transforms: &mut Transforms, transform: Transform) -> Self {
        Self {
            transform: transforms.insert(transform),
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    /// This node's transform slot
    pub fn transform(&self) -> TransformId {
        self.transform
    }

    /// Adopt `child`, parenting its transform to this node's
    pub fn add_child(&mut self, transforms: &mut Transforms, child: GameObject) -> &mut Self {
        transforms.link(child.transform, Some(self.transform));
        self.children.push(child);
        self
    }

    /// Attach a component to this node
    pub fn add_component<C: GameComponent>(&mut self, component: C) -> &mut Self {
        self.add_boxed_component(Box::new(component))
    }

    /// Attach an already boxed component
    pub fn add_boxed_component(&mut self, mut component: Box<dyn GameComponent>) -> &mut Self {
        component.attach(self.transform);
        self.components.push(component);
        self
    }

    /// Direct children
    pub fn children(&self) -> &[GameObject] {
        &self.children
    }

    /// Mutable direct children
    pub fn children_mut(&mut self) -> &mut [GameObject] {
        &mut self.children
    }

    /// Remove the direct child at `index` without tearing it down
    pub fn detach_child(&mut self, transforms: &mut Transforms, index: usize) -> Option<GameObject> {
        if index >= self.children.len() {
            return None;
        }
        let child = self.children.remove(index);
        transforms.link(child.transform, None);
        Some(child)
    }

    /// Number of components on this node
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// First component of type `T`
    pub fn get_component<T: GameComponent>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|component| component.as_any().downcast_ref::<T>())
    }

    /// First component of type `T`, mutably
    pub fn get_component_mut<T: GameComponent>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|component| component.as_any_mut().downcast_mut::<T>())
    }

    /// Input phase: snapshot this node's transform, then recurse
    pub fn input(&mut self, ctx: &mut FrameContext<'_>, delta: f32) {
        ctx.transforms.update(self.transform);
        for component in &mut self.components {
            component.input(ctx, delta);
        }
        for child in &mut self.children {
            child.input(ctx, delta);
        }
    }

    /// Update phase
    pub fn update(&mut self, ctx: &mut FrameContext<'_>, delta: f32) {
        for component in &mut self.components {
            component.update(ctx, delta);
        }
        for child in &mut self.children {
            child.update(ctx, delta);
        }
    }

    /// Draw the subtree into `pass`, stopping at the first failure
    pub fn render(&self, pass: &mut RenderPass<'_>) -> Result<(), RenderError> {
        for component in &self.components {
            component.render(pass)?;
        }
        for child in &self.children {
            child.render(pass)?;
        }
        Ok(())
    }

    /// Reset every component of the subtree
    pub fn reset(&mut self) {
        for component in &mut self.components {
            component.reset();
        }
        for child in &mut self.children {
            child.reset();
        }
    }

    /// Publish the subtree's renderer-facing state
    pub fn add_to_rendering_engine(&mut self, globals: &mut SharedGlobals, transforms: &mut Transforms) {
        for component in &mut self.components {
            component.add_to_rendering_engine(globals, transforms);
        }
        for child in &mut self.children {
            child.add_to_rendering_engine(globals, transforms);
        }
    }

    /// Withdraw the subtree's renderer-facing state
    pub fn remove_from_rendering_engine(&mut self, globals: &mut SharedGlobals) {
        for component in &mut self.components {
            component.remove_from_rendering_engine(globals);
        }
        for child in &mut self.children {
            child.remove_from_rendering_engine(globals);
        }
    }

    /// Unregister the subtree, free its transform slots and drop it
    pub fn despawn(mut self, transforms: &mut Transforms, globals: &mut SharedGlobals) -> Teardown {
        self.remove_from_rendering_engine(globals);
        self.release(transforms)
    }

    fn release(self, transforms: &mut Transforms) -> Teardown {
        let mut teardown = Teardown {
            objects: 1,
            components: self.components.len(),
        };
        transforms.remove(self.transform);
        for child in self.children {
            teardown += child.release(transforms);
        }
        teardown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use std::any::Any;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Tracer {
        transform: Option<TransformId>,
        label: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
        drops: Rc<Cell<usize>>,
    }

    impl Tracer {
        fn new(label: &'static str, log: &Rc<RefCell<Vec<&'static str>>>, drops: &Rc<Cell<usize>>) -> Self {
            Self {
                transform: None,
                label,
                log: Rc::clone(log),
                drops: Rc::clone(drops),
            }
        }
    }

    impl Drop for Tracer {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    impl GameComponent for Tracer {
        fn attach(&mut self, transform: TransformId) {
            self.transform = Some(transform);
        }

        fn transform(&self) -> Option<TransformId> {
            self.transform
        }

        fn reset(&mut self) {
            self.log.borrow_mut().push(self.label);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_traversal_order_components_then_children() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let drops = Rc::new(Cell::new(0));
        let mut transforms = Transforms::new();

        let mut child_a = GameObject::new(&mut transforms);
        child_a.add_component(Tracer::new("a", &log, &drops));
        let mut child_b = GameObject::new(&mut transforms);
        child_b.add_component(Tracer::new("b", &log, &drops));

        let mut root = GameObject::new(&mut transforms);
        root.add_component(Tracer::new("root-1", &log, &drops))
            .add_component(Tracer::new("root-2", &log, &drops))
            .add_child(&mut transforms, child_a)
            .add_child(&mut transforms, child_b);

        root.reset();
        assert_eq!(*log.borrow(), vec!["root-1", "root-2", "a", "b"]);
    }

    #[test]
    fn test_add_child_links_transforms() {
        let mut transforms = Transforms::new();
        let child = GameObject::with_transform(&mut transforms, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let child_transform = child.transform();
        let mut root = GameObject::with_transform(&mut transforms, Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        root.add_child(&mut transforms, child);

        assert_eq!(transforms.get(child_transform).and_then(Transform::parent), Some(root.transform()));
        assert_eq!(transforms.transformed_position(child_transform), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_despawn_releases_whole_subtree() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let drops = Rc::new(Cell::new(0));
        let mut transforms = Transforms::new();
        let mut globals = SharedGlobals::new();

        let mut root = GameObject::new(&mut transforms);
        for _ in 0..3 {
            let mut child = GameObject::new(&mut transforms);
            let mut grandchild = GameObject::new(&mut transforms);
            grandchild.add_component(Tracer::new("g", &log, &drops));
            child
                .add_component(Tracer::new("c", &log, &drops))
                .add_child(&mut transforms, grandchild);
            root.add_child(&mut transforms, child);
        }
        assert_eq!(transforms.len(), 7);

        let teardown = root.despawn(&mut transforms, &mut globals);

        assert_eq!(teardown, Teardown { objects: 7, components: 6 });
        assert_eq!(drops.get(), 6);
        assert!(transforms.is_empty());
    }

    #[test]
    fn test_get_component_downcasts() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let drops = Rc::new(Cell::new(0));
        let mut transforms = Transforms::new();
        let mut node = GameObject::new(&mut transforms);
        node.add_component(Tracer::new("x", &log, &drops));

        let tracer = node.get_component::<Tracer>().unwrap();
        assert_eq!(tracer.label, "x");
        assert_eq!(tracer.transform(), Some(node.transform()));
    }
}
