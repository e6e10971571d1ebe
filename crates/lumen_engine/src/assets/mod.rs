//! Asset loading
//!
//! Meshes come from Wavefront OBJ files and textures from any format the
//! `image` crate decodes. [`ResourceCache`] uploads each path once and hands
//! out shared handles afterwards.

pub mod image_loader;
pub mod obj_loader;
pub mod resource_cache;

pub use image_loader::ImageData;
pub use obj_loader::{ObjError, ObjLoader};
pub use resource_cache::ResourceCache;

use thiserror::Error;

use crate::render::RenderError;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unsupported asset format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Uploading the decoded asset failed
    #[error("Upload failed: {0}")]
    Render(#[from] RenderError),
}

impl From<ObjError> for AssetError {
    fn from(error: ObjError) -> Self {
        match error {
            ObjError::Io(io) => Self::Io(io),
            other => Self::InvalidData(other.to_string()),
        }
    }
}
