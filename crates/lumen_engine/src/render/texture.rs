//! Uploaded textures

use crate::assets::image_loader::ImageData;
use crate::render::backend::{RenderBackend, TextureHandle};
use crate::render::RenderError;

/// Texture resident in a backend
/// Shared through `Rc` so every user is counted before the backend copy is freed.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    handle: TextureHandle,
    width: u32,
    height: u32,
}

impl Texture {
    /// Upload decoded image data
    pub fn upload(backend: &mut dyn RenderBackend, image: &ImageData) -> Result<Self, RenderError> {
        let handle = backend.create_texture(image)?;
        Ok(Self {
            handle,
            width: image.width,
            height: image.height,
        })
    }

    /// Single-colour 1x1 texture
    pub fn solid(backend: &mut dyn RenderBackend, rgba: [u8; 4]) -> Result<Self, RenderError> {
        Self::upload(backend, &ImageData::solid_color(1, 1, rgba))
    }

    /// Free the backend copy
    pub fn release(self, backend: &mut dyn RenderBackend) {
        backend.delete_texture(self.handle);
    }

    /// Backend handle
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }
}
