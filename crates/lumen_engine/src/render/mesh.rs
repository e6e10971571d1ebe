//! Mesh representation for 3D models
//!
//! [`MeshData`] is CPU-side geometry as produced by loaders and the built-in
//! primitives; [`Mesh`] is the uploaded, drawable form held by renderers.

use crate::render::backend::{MeshHandle, RenderBackend};
use crate::render::RenderError;

/// Vertex with position, normal and texture coordinate
///
/// `#[repr(C)]` keeps the layout stable for buffer uploads. Eq and Hash
/// compare the float bit patterns so identical vertices can be deduplicated
/// while loading.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for value in self.position.iter().chain(&self.normal).chain(&self.tex_coord) {
            value.to_bits().hash(state);
        }
    }
}

impl Vertex {
    /// Create a vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }
}

/// CPU-side triangle geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data from vertices and indices
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Square in the XY plane facing +Z, `size` units across, centred on the origin
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        let n = [0.0, 0.0, 1.0];
        Self::new(
            vec![
                Vertex::new([-h, -h, 0.0], n, [0.0, 0.0]),
                Vertex::new([h, -h, 0.0], n, [1.0, 0.0]),
                Vertex::new([h, h, 0.0], n, [1.0, 1.0]),
                Vertex::new([-h, h, 0.0], n, [0.0, 1.0]),
            ],
            vec![0, 2, 1, 0, 3, 2],
        )
    }

    /// Axis-aligned cube with per-face normals, `size` units across
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
            for (su, sv, uv) in [(-1.0, -1.0, [0.0, 0.0]), (1.0, -1.0, [1.0, 0.0]), (1.0, 1.0, [1.0, 1.0]), (-1.0, 1.0, [0.0, 1.0])] {
                let position = [
                    (normal[0] + su * u[0] + sv * v[0]) * h,
                    (normal[1] + su * u[1] + sv * v[1]) * h,
                    (normal[2] + su * u[2] + sv * v[2]) * h,
                ];
                vertices.push(Vertex::new(position, normal, uv));
            }
            indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }
        Self::new(vertices, indices)
    }

    /// Same surface seen from the other side: winding reversed, normals negated
    pub fn inverted(mut self) -> Self {
        for triangle in self.indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
        for vertex in &mut self.vertices {
            vertex.normal = vertex.normal.map(|n| -n);
        }
        self
    }
}

/// Geometry uploaded to a backend; shared through `Rc`
#[derive(Debug, PartialEq, Eq)]
pub struct Mesh {
    handle: MeshHandle,
    vertex_count: usize,
    index_count: usize,
}

impl Mesh {
    /// Upload `data` and return the drawable mesh
    pub fn upload(backend: &mut dyn RenderBackend, data: &MeshData) -> Result<Self, RenderError> {
        let handle = backend.create_mesh(&data.vertices, &data.indices)?;
        log::debug!(
            "Uploaded mesh {:?}: {} vertices, {} triangles",
            handle,
            data.vertices.len(),
            data.triangle_count()
        );
        Ok(Self {
            handle,
            vertex_count: data.vertices.len(),
            index_count: data.indices.len(),
        })
    }

    /// Free the backend copy
    pub fn release(self, backend: &mut dyn RenderBackend) {
        log::debug!("Releasing mesh {:?}", self.handle);
        backend.delete_mesh(self.handle);
    }

    /// Backend handle
    pub fn handle(&self) -> MeshHandle {
        self.handle
    }

    /// Uploaded vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Uploaded index count
    pub fn index_count(&self) -> usize {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;
    use std::collections::HashSet;

    #[test]
    fn test_cube_has_six_faces() {
        let cube = MeshData::cube(2.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|c| c.abs() == 1.0)));
    }

    #[test]
    fn test_identical_vertices_hash_equal() {
        let mut set = HashSet::new();
        set.insert(Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5]));
        set.insert(Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5]));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_upload_tracks_counts() {
        let mut backend = RecordingBackend::new();
        let mesh = Mesh::upload(&mut backend, &MeshData::plane(4.0)).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(backend.mesh_count(), 1);
    }

    #[test]
    fn test_inverted_cube_faces_inward() {
        let cube = MeshData::cube(2.0);
        let inside = cube.clone().inverted();

        assert_eq!(&inside.indices[..3], &[cube.indices[0], cube.indices[2], cube.indices[1]]);
        for (outer, inner) in cube.vertices.iter().zip(&inside.vertices) {
            assert_eq!(inner.position, outer.position);
            assert_eq!(inner.normal, outer.normal.map(|n| -n));
        }
    }

    #[test]
    fn test_release_frees_backend_memory() {
        let mut backend = RecordingBackend::new();
        let mesh = Mesh::upload(&mut backend, &MeshData::cube(1.0)).unwrap();
        mesh.release(&mut backend);
        assert_eq!(backend.mesh_count(), 0);
        assert_eq!(backend.allocated_bytes(), 0);
    }
}
