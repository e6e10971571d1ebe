//! Path-keyed cache of uploaded meshes and textures
//!
//! Relative paths resolve against the asset root first and the working
//! directory second. A path is decoded and uploaded at most once; later
//! requests share the same [`Rc`].
//!
//! Backend memory is freed when the cache drops an entry it holds the last
//! reference to.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::assets::{AssetError, ImageData, ObjLoader};
use crate::render::{Mesh, MeshData, RenderBackend, Texture};

/// Shared meshes and textures keyed by resolved path
#[derive(Debug)]
pub struct ResourceCache {
    root: PathBuf,
    meshes: HashMap<PathBuf, Rc<Mesh>>,
    textures: HashMap<PathBuf, Rc<Texture>>,
}

impl ResourceCache {
    /// Empty cache resolving relative paths against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    /// Asset root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location a request for `path` is served from
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let under_root = self.root.join(path);
        if under_root.exists() {
            under_root
        } else {
            path.to_path_buf()
        }
    }

    /// Mesh loaded from an OBJ file
    pub fn mesh(&mut self, backend: &mut dyn RenderBackend, path: impl AsRef<Path>) -> Result<Rc<Mesh>, AssetError> {
        let key = self.resolve(path);
        if let Some(mesh) = self.meshes.get(&key) {
            log::trace!("Mesh cache hit: {}", key.display());
            return Ok(Rc::clone(mesh));
        }

        let is_obj = key
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
        if !is_obj {
            return Err(AssetError::UnsupportedFormat(format!("{}: only OBJ meshes are supported", key.display())));
        }
        if !key.exists() {
            return Err(AssetError::NotFound(key.display().to_string()));
        }

        let data = ObjLoader::load_obj(&key)?;
        let mesh = Rc::new(Mesh::upload(backend, &data)?);
        log::info!("Loaded mesh {}", key.display());
        self.meshes.insert(key, Rc::clone(&mesh));
        Ok(mesh)
    }

    /// Mesh built in code, cached under `name`
    pub fn mesh_from_data(
        &mut self,
        backend: &mut dyn RenderBackend,
        name: &str,
        data: &MeshData,
    ) -> Result<Rc<Mesh>, AssetError> {
        let key = PathBuf::from(name);
        if let Some(mesh) = self.meshes.get(&key) {
            return Ok(Rc::clone(mesh));
        }
        let mesh = Rc::new(Mesh::upload(backend, data)?);
        self.meshes.insert(key, Rc::clone(&mesh));
        Ok(mesh)
    }

    /// Texture decoded from an image file
    pub fn texture(&mut self, backend: &mut dyn RenderBackend, path: impl AsRef<Path>) -> Result<Rc<Texture>, AssetError> {
        let key = self.resolve(path);
        if let Some(texture) = self.textures.get(&key) {
            log::trace!("Texture cache hit: {}", key.display());
            return Ok(Rc::clone(texture));
        }

        let image = ImageData::from_file(&key)?;
        let texture = Rc::new(Texture::upload(backend, &image)?);
        self.textures.insert(key, Rc::clone(&texture));
        Ok(texture)
    }

    /// 1x1 texture of one colour, shared per colour
    pub fn solid_texture(&mut self, backend: &mut dyn RenderBackend, rgba: [u8; 4]) -> Result<Rc<Texture>, AssetError> {
        let [r, g, b, a] = rgba;
        let key = PathBuf::from(format!("#{r:02x}{g:02x}{b:02x}{a:02x}"));
        if let Some(texture) = self.textures.get(&key) {
            return Ok(Rc::clone(texture));
        }
        let texture = Rc::new(Texture::solid(backend, rgba)?);
        self.textures.insert(key, Rc::clone(&texture));
        Ok(texture)
    }

    /// Cached meshes
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Cached textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Names from `mesh_from_data` and `solid_texture` are stored unresolved
    fn cached_key(&self, path: &Path, stored_as_is: bool) -> PathBuf {
        if stored_as_is {
            path.to_path_buf()
        } else {
            self.resolve(path)
        }
    }

    /// Remove the mesh cached under `path`, freeing it if nothing else holds it.
    ///
    /// Returns whether backend memory was released.
    pub fn evict_mesh(&mut self, backend: &mut dyn RenderBackend, path: impl AsRef<Path>) -> bool {
        let key = self.cached_key(path.as_ref(), self.meshes.contains_key(path.as_ref()));
        self.meshes
            .remove(&key)
            .is_some_and(|mesh| release_mesh(backend, mesh))
    }

    /// Remove the texture cached under `path`, freeing it if nothing else holds it
    pub fn evict_texture(&mut self, backend: &mut dyn RenderBackend, path: impl AsRef<Path>) -> bool {
        let key = self.cached_key(path.as_ref(), self.textures.contains_key(path.as_ref()));
        self.textures
            .remove(&key)
            .is_some_and(|texture| release_texture(backend, texture))
    }

    /// Free every entry the cache alone still holds; returns how many were freed
    pub fn purge_unused(&mut self, backend: &mut dyn RenderBackend) -> usize {
        let mut freed = 0;
        let unused: Vec<PathBuf> = unused_keys(&self.meshes);
        for key in unused {
            if let Some(mesh) = self.meshes.remove(&key) {
                freed += usize::from(release_mesh(backend, mesh));
            }
        }
        let unused: Vec<PathBuf> = unused_keys(&self.textures);
        for key in unused {
            if let Some(texture) = self.textures.remove(&key) {
                freed += usize::from(release_texture(backend, texture));
            }
        }
        if freed > 0 {
            log::debug!("Purged {} unused resources", freed);
        }
        freed
    }

    /// Drop every entry, freeing those nothing else holds
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        let mut in_use = 0;
        for (_, mesh) in self.meshes.drain() {
            in_use += usize::from(!release_mesh(backend, mesh));
        }
        for (_, texture) in self.textures.drain() {
            in_use += usize::from(!release_texture(backend, texture));
        }
        if in_use > 0 {
            log::warn!("{} cached resources still in use at clear", in_use);
        }
    }
}

fn unused_keys<T>(entries: &HashMap<PathBuf, Rc<T>>) -> Vec<PathBuf> {
    entries
        .iter()
        .filter(|(_, entry)| Rc::strong_count(entry) == 1)
        .map(|(key, _)| key.clone())
        .collect()
}

fn release_mesh(backend: &mut dyn RenderBackend, mesh: Rc<Mesh>) -> bool {
    match Rc::try_unwrap(mesh) {
        Ok(mesh) => {
            mesh.release(backend);
            true
        }
        Err(_) => false,
    }
}

fn release_texture(backend: &mut dyn RenderBackend, texture: Rc<Texture>) -> bool {
    match Rc::try_unwrap(texture) {
        Ok(texture) => {
            texture.release(backend);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lumen_cache_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_same_path_shares_one_upload() {
        let dir = scratch_dir("mesh");
        fs::write(dir.join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new(&dir);

        let first = cache.mesh(&mut backend, "tri.obj").unwrap();
        let bytes = backend.allocated_bytes();
        let second = cache.mesh(&mut backend, "tri.obj").unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(backend.mesh_count(), 1);
        assert_eq!(backend.allocated_bytes(), bytes);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_texture_loaded_once() {
        let dir = scratch_dir("texture");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]))
            .save(dir.join("green.png"))
            .unwrap();
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new(&dir);

        let first = cache.texture(&mut backend, "green.png").unwrap();
        let second = cache.texture(&mut backend, "green.png").unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.width(), 2);
        assert_eq!(backend.texture_count(), 1);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_and_unsupported_meshes() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new(std::env::temp_dir());

        assert!(matches!(
            cache.mesh(&mut backend, "lumen_no_such_mesh_4c2e.obj"),
            Err(AssetError::NotFound(_))
        ));
        assert!(matches!(
            cache.mesh(&mut backend, "model.fbx"),
            Err(AssetError::UnsupportedFormat(_))
        ));
        assert_eq!(cache.mesh_count(), 0);
    }

    #[test]
    fn test_purge_frees_only_unreferenced_entries() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new("resources");
        let kept = cache.mesh_from_data(&mut backend, "kept", &MeshData::cube(1.0)).unwrap();
        cache.mesh_from_data(&mut backend, "dropped", &MeshData::plane(4.0)).unwrap();
        cache.solid_texture(&mut backend, [1, 2, 3, 255]).unwrap();
        assert_eq!((backend.mesh_count(), backend.texture_count()), (2, 1));

        assert_eq!(cache.purge_unused(&mut backend), 2);
        assert_eq!(backend.mesh_count(), 1);
        assert_eq!(backend.texture_count(), 0);
        assert_eq!(cache.mesh_count(), 1);
        assert!(Rc::ptr_eq(&kept, &cache.mesh_from_data(&mut backend, "kept", &MeshData::cube(1.0)).unwrap()));
    }

    #[test]
    fn test_evict_keeps_meshes_still_in_use() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new("resources");
        let held = cache.mesh_from_data(&mut backend, "held", &MeshData::cube(1.0)).unwrap();

        assert!(!cache.evict_mesh(&mut backend, "held"));
        assert_eq!(backend.mesh_count(), 1);
        assert_eq!(cache.mesh_count(), 0);

        Rc::try_unwrap(held).unwrap().release(&mut backend);
        assert_eq!(backend.mesh_count(), 0);
        assert_eq!(backend.allocated_bytes(), 0);
    }

    #[test]
    fn test_clear_releases_backend_memory() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new("resources");
        cache.mesh_from_data(&mut backend, "cube", &MeshData::cube(1.0)).unwrap();
        cache.solid_texture(&mut backend, [0, 0, 0, 255]).unwrap();

        cache.clear(&mut backend);
        assert_eq!(cache.mesh_count() + cache.texture_count(), 0);
        assert_eq!(backend.mesh_count() + backend.texture_count(), 0);
        assert_eq!(backend.allocated_bytes(), 0);
    }

    #[test]
    fn test_solid_textures_shared_per_colour() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new("resources");
        let a = cache.solid_texture(&mut backend, [255, 0, 0, 255]).unwrap();
        let b = cache.solid_texture(&mut backend, [255, 0, 0, 255]).unwrap();
        let c = cache.solid_texture(&mut backend, [0, 0, 255, 255]).unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(backend.texture_count(), 2);
    }
}
