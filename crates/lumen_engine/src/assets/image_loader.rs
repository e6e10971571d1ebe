//! Image decoding for textures
//!
//! Every image is expanded to RGBA8 so the backend only ever sees one layout.

use std::path::Path;

use crate::assets::AssetError;

/// Decoded RGBA8 pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Row-major pixel data, four bytes per pixel
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per pixel; always 4
    pub channels: u8,
}

impl ImageData {
    /// Decode an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }
        let decoded = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        let image = Self::from_dynamic(decoded);
        log::info!("Loaded image {}x{} from {}", image.width, image.height, path.display());
        Ok(image)
    }

    /// Decode an in-memory encoded image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| AssetError::InvalidData(format!("undecodable image: {e}")))?;
        Ok(Self::from_dynamic(decoded))
    }

    /// Image filled with one colour
    pub fn solid_color(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            data: rgba.repeat(pixels),
            width,
            height,
            channels: 4,
        }
    }

    fn from_dynamic(decoded: image::DynamicImage) -> Self {
        let rgba = decoded.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            data: rgba.into_raw(),
            width,
            height,
            channels: 4,
        }
    }

    /// Pixel at `(x, y)`, if inside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.data.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_solid_color_image() {
        let image = ImageData::solid_color(3, 2, [10, 20, 30, 255]);
        assert_eq!(image.size_bytes(), 3 * 2 * 4);
        assert_eq!(image.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(image.pixel(3, 0), None);
    }

    #[test]
    fn test_png_bytes_decode_to_rgba() {
        let mut source = image::RgbImage::new(2, 1);
        source.put_pixel(1, 0, image::Rgb([255, 128, 0]));
        let mut encoded = Cursor::new(Vec::new());
        source.write_to(&mut encoded, image::ImageFormat::Png).unwrap();

        let decoded = ImageData::from_bytes(encoded.get_ref()).unwrap();
        assert_eq!((decoded.width, decoded.height, decoded.channels), (2, 1, 4));
        assert_eq!(decoded.pixel(1, 0), Some([255, 128, 0, 255]));
    }

    #[test]
    fn test_garbage_bytes_are_invalid() {
        assert!(matches!(ImageData::from_bytes(b"not an image"), Err(AssetError::InvalidData(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let path = std::env::temp_dir().join("lumen_missing_image_7d1f.png");
        assert!(matches!(ImageData::from_file(path), Err(AssetError::NotFound(_))));
    }
}
